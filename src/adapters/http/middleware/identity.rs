//! Caller identity extractor for axum.
//!
//! Authentication happens upstream (gateway or session layer). The verified
//! user id reaches this service in the [`USER_ID_HEADER`] header; handlers
//! read it with [`RequireUser`].
//!
//! ```text
//! Gateway (authenticates) → x-user-id: <id> → RequireUser extractor → Handler
//! ```

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::UserId;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor that requires an identified caller.
///
/// Rejects with 401 when the header is missing, not UTF-8, or blank.
#[derive(Debug, Clone)]
pub struct RequireUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = IdentityRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .ok_or(IdentityRejection::Unauthenticated)?;

        UserId::new(raw)
            .map(RequireUser)
            .map_err(|_| IdentityRejection::Unauthenticated)
    }
}

/// Rejection type for identity failures.
#[derive(Debug, Clone)]
pub enum IdentityRejection {
    /// No usable user id was supplied.
    Unauthenticated,
}

impl IntoResponse for IdentityRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            IdentityRejection::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "Authentication required")
            }
        };

        (
            status,
            Json(serde_json::json!({
                "error": message,
                "code": "UNAUTHENTICATED"
            })),
        )
            .into_response()
    }
}

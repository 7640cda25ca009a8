//! Application-level error taxonomy.
//!
//! Everything here is caller-visible and happens before a provider stream is
//! opened. Failures after a stream has ended are settlement failures and are
//! only logged.

use thiserror::Error;

use crate::domain::entitlement::Denial;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::AIError;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Entitlement check refused the action.
    #[error("access denied: {0}")]
    AccessDenied(Box<Denial>),

    /// Resource absent, deleted, or not owned by the caller.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// The AI provider failed before a stream could be handed out.
    #[error("upstream provider error: {0}")]
    Upstream(#[from] AIError),

    /// Caller input rejected.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Persistence failure.
    #[error("storage error: {0}")]
    Storage(DomainError),
}

impl ChatError {
    pub fn thread_not_found(id: impl ToString) -> Self {
        ChatError::NotFound {
            resource: "thread",
            id: id.to_string(),
        }
    }

    pub fn denied(denial: Denial) -> Self {
        ChatError::AccessDenied(Box::new(denial))
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            ChatError::AccessDenied(denial) => Some(denial),
            _ => None,
        }
    }
}

impl From<DomainError> for ChatError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed | ErrorCode::InvalidFormat | ErrorCode::ThreadDeleted => {
                ChatError::Validation(err.message)
            }
            ErrorCode::ThreadNotFound => ChatError::NotFound {
                resource: "thread",
                id: err.details.get("thread_id").cloned().unwrap_or_default(),
            },
            ErrorCode::MessageNotFound => ChatError::NotFound {
                resource: "message",
                id: err.details.get("message_id").cloned().unwrap_or_default(),
            },
            _ => ChatError::Storage(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_domain_errors_become_validation() {
        let err: ChatError = DomainError::new(ErrorCode::ValidationFailed, "name empty").into();
        assert!(matches!(err, ChatError::Validation(msg) if msg == "name empty"));
    }

    #[test]
    fn thread_not_found_keeps_id() {
        let err: ChatError = DomainError::new(ErrorCode::ThreadNotFound, "missing")
            .with_detail("thread_id", "abc")
            .into();
        assert!(matches!(err, ChatError::NotFound { resource: "thread", id } if id == "abc"));
    }

    #[test]
    fn database_errors_are_storage() {
        let err: ChatError = DomainError::database("connection reset").into();
        assert!(matches!(err, ChatError::Storage(_)));
    }

    #[test]
    fn provider_errors_convert() {
        let err: ChatError = AIError::AuthenticationFailed.into();
        assert!(matches!(err, ChatError::Upstream(AIError::AuthenticationFailed)));
    }
}

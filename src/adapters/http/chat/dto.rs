//! HTTP DTOs for chat endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::domain::chat::{Message, Thread};
use crate::domain::entitlement::Denial;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to open a new thread with an assistant.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateThreadRequest {
    pub assistant_id: String,
}

/// Request to rename a thread.
#[derive(Debug, Clone, Deserialize)]
pub struct RenameThreadRequest {
    pub name: String,
}

/// A user turn.
#[derive(Debug, Clone, Deserialize)]
pub struct PostTurnRequest {
    pub content: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct ThreadResponse {
    pub id: String,
    pub assistant_id: String,
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Thread> for ThreadResponse {
    fn from(thread: &Thread) -> Self {
        Self {
            id: thread.id().to_string(),
            assistant_id: thread.assistant_id().to_string(),
            handle: thread.provider_handle().to_string(),
            name: thread.name().map(str::to_string),
            created_at: thread.created_at().as_datetime().to_rfc3339(),
            updated_at: thread.updated_at().as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub role: &'static str,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,
    pub created_at: String,
}

impl From<&Message> for MessageResponse {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id().to_string(),
            role: message.role().as_str(),
            body: message.body().to_string(),
            category: message.category().map(|c| c.as_str()),
            created_at: message.created_at().as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadNameResponse {
    pub name: String,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_code("BAD_REQUEST", message)
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self::with_code("NOT_FOUND", format!("{} not found: {}", resource_type, id))
    }

    pub fn upstream(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: "UPSTREAM_ERROR".to_string(),
            message: message.into(),
            details: Some(serde_json::json!({ "provider_code": code })),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_code("INTERNAL_ERROR", message)
    }

    /// Structured entitlement denial.
    pub fn denied(denial: &Denial) -> Self {
        Self {
            code: denial.reason.code().to_string(),
            message: denial.user_message(),
            details: serde_json::to_value(denial).ok(),
        }
    }

    fn with_code(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::Category;
    use crate::domain::foundation::{AssistantId, ProviderThreadHandle, ThreadId, UserId};

    #[test]
    fn create_thread_request_deserializes() {
        let req: CreateThreadRequest =
            serde_json::from_str(r#"{"assistant_id": "asst_avionics"}"#).unwrap();
        assert_eq!(req.assistant_id, "asst_avionics");
    }

    #[test]
    fn thread_response_omits_missing_name() {
        let thread = Thread::new(
            UserId::new("user-1").unwrap(),
            AssistantId::new("asst_avionics").unwrap(),
            ProviderThreadHandle::new("thread_abc").unwrap(),
        );
        let json = serde_json::to_value(ThreadResponse::from(&thread)).unwrap();
        assert_eq!(json["handle"], "thread_abc");
        assert!(json.get("name").is_none());
    }

    #[test]
    fn message_response_carries_category_label() {
        let message = Message::assistant(ThreadId::new(), "Check the outflow valve.")
            .unwrap()
            .with_category(Category::Environmental);
        let json = serde_json::to_value(MessageResponse::from(&message)).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["category"], "environmental");
    }

    #[test]
    fn error_response_not_found_creates_correctly() {
        let error = ErrorResponse::not_found("thread", "abc-123");
        assert_eq!(error.code, "NOT_FOUND");
        assert!(error.message.contains("abc-123"));
    }
}

//! Message entity.
//!
//! One conversational turn within a thread. Role is fixed at creation; the
//! topic category arrives later from the classifier and is set at most once.

use serde::{Deserialize, Serialize};

use super::Category;
use crate::domain::foundation::{
    DomainError, ErrorCode, MessageId, ThreadId, Timestamp, ValidationError,
};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

/// A single turn in a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    thread_id: ThreadId,
    role: MessageRole,
    body: String,
    category: Option<Category>,
    deleted_at: Option<Timestamp>,
    created_at: Timestamp,
}

impl Message {
    /// Creates a new turn.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if body is empty or whitespace
    pub fn new(
        thread_id: ThreadId,
        role: MessageRole,
        body: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(ValidationError::empty_field("body").into());
        }
        Ok(Self {
            id: MessageId::new(),
            thread_id,
            role,
            body,
            category: None,
            deleted_at: None,
            created_at: Timestamp::now(),
        })
    }

    pub fn user(thread_id: ThreadId, body: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(thread_id, MessageRole::User, body)
    }

    pub fn assistant(thread_id: ThreadId, body: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(thread_id, MessageRole::Assistant, body)
    }

    /// Reconstitutes a message from persistence (no validation).
    pub fn reconstitute(
        id: MessageId,
        thread_id: ThreadId,
        role: MessageRole,
        body: String,
        category: Option<Category>,
        deleted_at: Option<Timestamp>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            thread_id,
            role,
            body,
            category,
            deleted_at,
            created_at,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn deleted_at(&self) -> Option<Timestamp> {
        self.deleted_at
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Assigns the topic category.
    ///
    /// # Errors
    ///
    /// - `CategoryAlreadyAssigned` if a category is already set
    pub fn assign_category(&mut self, category: Category) -> Result<(), DomainError> {
        if let Some(existing) = self.category {
            return Err(DomainError::new(
                ErrorCode::CategoryAlreadyAssigned,
                format!("Message already categorized as {}", existing),
            )
            .with_detail("message_id", self.id.to_string()));
        }
        self.category = Some(category);
        Ok(())
    }

    /// Builder-style variant used when the category is known at creation.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn soft_delete(&mut self) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(Timestamp::now());
        }
    }
}

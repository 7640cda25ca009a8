//! Thread aggregate.
//!
//! A thread is one conversation between a user and an assistant. It is
//! mirrored by a conversation hosted at the AI provider, referenced through
//! `provider_handle`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    AssistantId, DomainError, ErrorCode, ProviderThreadHandle, ThreadId, Timestamp, UserId,
    ValidationError,
};

/// Maximum display name length, in characters.
pub const MAX_THREAD_NAME_LEN: usize = 120;

/// A conversation owned by exactly one user.
///
/// # Invariants
///
/// - `user_id` and `assistant_id` never change after creation
/// - deletion is a timestamp, never a physical removal
/// - a deleted thread cannot be renamed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    id: ThreadId,
    user_id: UserId,
    assistant_id: AssistantId,
    provider_handle: ProviderThreadHandle,
    name: Option<String>,
    deleted_at: Option<Timestamp>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Thread {
    pub fn new(
        user_id: UserId,
        assistant_id: AssistantId,
        provider_handle: ProviderThreadHandle,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: ThreadId::new(),
            user_id,
            assistant_id,
            provider_handle,
            name: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitutes a thread from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ThreadId,
        user_id: UserId,
        assistant_id: AssistantId,
        provider_handle: ProviderThreadHandle,
        name: Option<String>,
        deleted_at: Option<Timestamp>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            assistant_id,
            provider_handle,
            name,
            deleted_at,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn assistant_id(&self) -> &AssistantId {
        &self.assistant_id
    }

    pub fn provider_handle(&self) -> &ProviderThreadHandle {
        &self.provider_handle
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn deleted_at(&self) -> Option<Timestamp> {
        self.deleted_at
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    /// Sets the display name.
    ///
    /// # Errors
    ///
    /// - `ThreadDeleted` if the thread was soft-deleted
    /// - `ValidationFailed` if the trimmed name is empty or too long
    pub fn rename(&mut self, name: &str) -> Result<(), DomainError> {
        if self.is_deleted() {
            return Err(DomainError::new(
                ErrorCode::ThreadDeleted,
                "Cannot rename a deleted thread",
            )
            .with_detail("thread_id", self.id.to_string()));
        }

        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("name").into());
        }
        if trimmed.chars().count() > MAX_THREAD_NAME_LEN {
            return Err(ValidationError::too_long("name", MAX_THREAD_NAME_LEN).into());
        }

        self.name = Some(trimmed.to_string());
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Marks the thread deleted. Idempotent.
    pub fn soft_delete(&mut self) {
        if self.deleted_at.is_none() {
            let now = Timestamp::now();
            self.deleted_at = Some(now);
            self.updated_at = now;
        }
    }

    /// Bumps `updated_at` after a new turn. Deleted threads keep their
    /// deletion time.
    pub fn touch(&mut self, at: Timestamp) {
        if !self.is_deleted() {
            self.updated_at = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread() -> Thread {
        Thread::new(
            UserId::new("user-1").unwrap(),
            AssistantId::new("asst_line_maintenance").unwrap(),
            ProviderThreadHandle::new("thread_abc").unwrap(),
        )
    }

    #[test]
    fn new_thread_has_no_name_and_is_live() {
        let t = thread();
        assert!(t.name().is_none());
        assert!(!t.is_deleted());
        assert!(t.is_owned_by(&UserId::new("user-1").unwrap()));
        assert!(!t.is_owned_by(&UserId::new("user-2").unwrap()));
    }

    #[test]
    fn rename_trims_whitespace() {
        let mut t = thread();
        t.rename("  Pack 2 trip on climb  ").unwrap();
        assert_eq!(t.name(), Some("Pack 2 trip on climb"));
    }

    #[test]
    fn rename_rejects_blank() {
        let mut t = thread();
        let err = t.rename("   ").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn rename_rejects_overlong_name() {
        let mut t = thread();
        let long = "x".repeat(MAX_THREAD_NAME_LEN + 1);
        assert!(t.rename(&long).is_err());
        assert!(t.rename(&"x".repeat(MAX_THREAD_NAME_LEN)).is_ok());
    }

    #[test]
    fn deleted_thread_cannot_be_renamed() {
        let mut t = thread();
        t.soft_delete();
        let err = t.rename("anything").unwrap_err();
        assert_eq!(err.code, ErrorCode::ThreadDeleted);
    }

    #[test]
    fn soft_delete_is_idempotent() {
        let mut t = thread();
        t.soft_delete();
        let first = t.deleted_at();
        t.soft_delete();
        assert_eq!(t.deleted_at(), first);
    }

    #[test]
    fn touch_leaves_deleted_thread_alone() {
        let mut t = thread();
        let later = Timestamp::now().add_days(1);
        t.touch(later);
        assert_eq!(t.updated_at(), later);

        t.soft_delete();
        let deleted_at = t.updated_at();
        t.touch(later.add_days(1));
        assert_eq!(t.updated_at(), deleted_at);
    }
}

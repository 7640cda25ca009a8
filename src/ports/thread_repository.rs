//! Thread repository port.
//!
//! Every read excludes soft-deleted threads. Deleting is an `update` with a
//! deletion timestamp set; there is no physical delete.

use async_trait::async_trait;

use crate::domain::chat::Thread;
use crate::domain::foundation::{DomainError, ProviderThreadHandle, ThreadId, Timestamp, UserId};

#[async_trait]
pub trait ThreadRepository: Send + Sync {
    /// Save a new thread.
    async fn save(&self, thread: &Thread) -> Result<(), DomainError>;

    /// Persist changes to name, deletion marker and `updated_at`.
    ///
    /// # Errors
    ///
    /// - `ThreadNotFound` if the thread does not exist
    async fn update(&self, thread: &Thread) -> Result<(), DomainError>;

    /// Set `updated_at` on a live thread, leaving every other column alone.
    ///
    /// Returns false when the thread is missing or soft-deleted.
    async fn touch(&self, id: &ThreadId, at: Timestamp) -> Result<bool, DomainError>;

    async fn find_by_id(&self, id: &ThreadId) -> Result<Option<Thread>, DomainError>;

    async fn find_by_handle(&self, handle: &ProviderThreadHandle) -> Result<Option<Thread>, DomainError>;

    /// The user's threads, most recently updated first.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Thread>, DomainError>;
}

//! Message repository port.
//!
//! Messages are append-only. The only mutations are the one-time category
//! assignment and soft deletion alongside their thread.

use async_trait::async_trait;

use crate::domain::chat::{Category, Message};
use crate::domain::foundation::{DomainError, MessageId, ThreadId};

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn append(&self, message: &Message) -> Result<(), DomainError>;

    /// Non-deleted messages of a thread, oldest first.
    async fn list_by_thread(&self, thread_id: &ThreadId) -> Result<Vec<Message>, DomainError>;

    /// Most recent non-deleted user message without a category.
    async fn latest_uncategorized_user_message(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Option<Message>, DomainError>;

    /// Sets the category unless one is already present.
    ///
    /// Returns `false` when the message already had a category.
    async fn set_category_if_absent(
        &self,
        message_id: &MessageId,
        category: Category,
    ) -> Result<bool, DomainError>;

    /// Soft-deletes every message in the thread. Returns the number affected.
    async fn soft_delete_for_thread(&self, thread_id: &ThreadId) -> Result<u64, DomainError>;
}

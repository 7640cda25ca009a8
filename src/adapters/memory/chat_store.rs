//! In-memory thread and message store.
//!
//! Useful for development and tests. Messages keep insertion order, which is
//! also creation order.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::chat::{Category, Message, MessageRole, Thread};
use crate::domain::foundation::{
    DomainError, ErrorCode, MessageId, ProviderThreadHandle, ThreadId, Timestamp, UserId,
};
use crate::ports::{MessageRepository, ThreadRepository};

/// In-memory storage for threads and their messages.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChatStore {
    threads: Arc<RwLock<HashMap<ThreadId, Thread>>>,
    messages: Arc<RwLock<Vec<Message>>>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored message, deleted ones included.
    pub async fn all_messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    /// Every stored thread, deleted ones included.
    pub async fn all_threads(&self) -> Vec<Thread> {
        self.threads.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl ThreadRepository for InMemoryChatStore {
    async fn save(&self, thread: &Thread) -> Result<(), DomainError> {
        self.threads.write().await.insert(thread.id(), thread.clone());
        Ok(())
    }

    async fn update(&self, thread: &Thread) -> Result<(), DomainError> {
        let mut threads = self.threads.write().await;
        match threads.get_mut(&thread.id()) {
            Some(existing) => {
                *existing = thread.clone();
                Ok(())
            }
            None => Err(DomainError::new(ErrorCode::ThreadNotFound, "Thread not found")
                .with_detail("thread_id", thread.id().to_string())),
        }
    }

    async fn touch(&self, id: &ThreadId, at: Timestamp) -> Result<bool, DomainError> {
        let mut threads = self.threads.write().await;
        match threads.get_mut(id).filter(|t| !t.is_deleted()) {
            Some(thread) => {
                thread.touch(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by_id(&self, id: &ThreadId) -> Result<Option<Thread>, DomainError> {
        let threads = self.threads.read().await;
        Ok(threads.get(id).filter(|t| !t.is_deleted()).cloned())
    }

    async fn find_by_handle(
        &self,
        handle: &ProviderThreadHandle,
    ) -> Result<Option<Thread>, DomainError> {
        let threads = self.threads.read().await;
        Ok(threads
            .values()
            .find(|t| t.provider_handle() == handle && !t.is_deleted())
            .cloned())
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Thread>, DomainError> {
        let threads = self.threads.read().await;
        let mut owned: Vec<Thread> = threads
            .values()
            .filter(|t| t.is_owned_by(user_id) && !t.is_deleted())
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        Ok(owned)
    }
}

#[async_trait]
impl MessageRepository for InMemoryChatStore {
    async fn append(&self, message: &Message) -> Result<(), DomainError> {
        self.messages.write().await.push(message.clone());
        Ok(())
    }

    async fn list_by_thread(&self, thread_id: &ThreadId) -> Result<Vec<Message>, DomainError> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| &m.thread_id() == thread_id && !m.is_deleted())
            .cloned()
            .collect())
    }

    async fn latest_uncategorized_user_message(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Option<Message>, DomainError> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .rev()
            .find(|m| {
                &m.thread_id() == thread_id
                    && !m.is_deleted()
                    && m.role() == MessageRole::User
                    && m.category().is_none()
            })
            .cloned())
    }

    async fn set_category_if_absent(
        &self,
        message_id: &MessageId,
        category: Category,
    ) -> Result<bool, DomainError> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| &m.id() == message_id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::MessageNotFound, "Message not found")
                    .with_detail("message_id", message_id.to_string())
            })?;
        Ok(message.assign_category(category).is_ok())
    }

    async fn soft_delete_for_thread(&self, thread_id: &ThreadId) -> Result<u64, DomainError> {
        let mut messages = self.messages.write().await;
        let mut affected = 0;
        for message in messages
            .iter_mut()
            .filter(|m| &m.thread_id() == thread_id && !m.is_deleted())
        {
            message.soft_delete();
            affected += 1;
        }
        Ok(affected)
    }
}

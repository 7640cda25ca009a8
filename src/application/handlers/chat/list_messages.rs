//! ListMessagesHandler - Query handler for a thread's messages.

use std::sync::Arc;

use crate::application::ChatError;
use crate::domain::chat::Message;
use crate::domain::foundation::{ThreadId, UserId};
use crate::ports::{MessageRepository, ThreadRepository};

#[derive(Debug, Clone)]
pub struct ListMessagesQuery {
    pub thread_id: ThreadId,
    pub user_id: UserId,
}

pub struct ListMessagesHandler {
    threads: Arc<dyn ThreadRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl ListMessagesHandler {
    pub fn new(threads: Arc<dyn ThreadRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { threads, messages }
    }

    /// Messages in creation order.
    ///
    /// A missing or deleted thread yields an empty list. A live thread owned
    /// by someone else is `NotFound`.
    pub async fn handle(&self, query: ListMessagesQuery) -> Result<Vec<Message>, ChatError> {
        let thread = match self.threads.find_by_id(&query.thread_id).await? {
            Some(thread) => thread,
            None => return Ok(Vec::new()),
        };
        if !thread.is_owned_by(&query.user_id) {
            return Err(ChatError::thread_not_found(query.thread_id));
        }
        Ok(self.messages.list_by_thread(&query.thread_id).await?)
    }
}

//! ListThreadsHandler - Query handler for a user's threads.

use std::sync::Arc;

use crate::application::ChatError;
use crate::domain::chat::Thread;
use crate::domain::foundation::UserId;
use crate::ports::ThreadRepository;

#[derive(Debug, Clone)]
pub struct ListThreadsQuery {
    pub user_id: UserId,
}

pub struct ListThreadsHandler {
    threads: Arc<dyn ThreadRepository>,
}

impl ListThreadsHandler {
    pub fn new(threads: Arc<dyn ThreadRepository>) -> Self {
        Self { threads }
    }

    /// Non-deleted threads, most recently updated first.
    pub async fn handle(&self, query: ListThreadsQuery) -> Result<Vec<Thread>, ChatError> {
        Ok(self.threads.list_by_user(&query.user_id).await?)
    }
}

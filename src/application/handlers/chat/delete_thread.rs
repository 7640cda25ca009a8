//! DeleteThreadHandler - Soft-deletes a thread and its messages.

use std::sync::Arc;

use tracing::info;

use crate::application::ChatError;
use crate::domain::foundation::{ThreadId, UserId};
use crate::ports::{MessageRepository, ThreadRepository};

#[derive(Debug, Clone)]
pub struct DeleteThreadCommand {
    pub thread_id: ThreadId,
    pub user_id: UserId,
}

pub struct DeleteThreadHandler {
    threads: Arc<dyn ThreadRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl DeleteThreadHandler {
    pub fn new(threads: Arc<dyn ThreadRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { threads, messages }
    }

    /// Marks the thread and its messages deleted. Rows are kept.
    pub async fn handle(&self, cmd: DeleteThreadCommand) -> Result<(), ChatError> {
        let mut thread = self
            .threads
            .find_by_id(&cmd.thread_id)
            .await?
            .filter(|t| t.is_owned_by(&cmd.user_id))
            .ok_or_else(|| ChatError::thread_not_found(cmd.thread_id))?;

        thread.soft_delete();
        self.threads.update(&thread).await?;
        let messages = self.messages.soft_delete_for_thread(&cmd.thread_id).await?;

        info!(thread_id = %cmd.thread_id, messages, "thread deleted");
        Ok(())
    }
}

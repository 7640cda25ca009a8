//! RenameThreadHandler - Command handler for renaming a thread.

use std::sync::Arc;

use crate::application::ChatError;
use crate::domain::chat::Thread;
use crate::domain::foundation::{ThreadId, UserId};
use crate::ports::ThreadRepository;

#[derive(Debug, Clone)]
pub struct RenameThreadCommand {
    pub thread_id: ThreadId,
    pub user_id: UserId,
    pub name: String,
}

pub struct RenameThreadHandler {
    threads: Arc<dyn ThreadRepository>,
}

impl RenameThreadHandler {
    pub fn new(threads: Arc<dyn ThreadRepository>) -> Self {
        Self { threads }
    }

    pub async fn handle(&self, cmd: RenameThreadCommand) -> Result<Thread, ChatError> {
        let mut thread = self
            .threads
            .find_by_id(&cmd.thread_id)
            .await?
            .filter(|t| t.is_owned_by(&cmd.user_id))
            .ok_or_else(|| ChatError::thread_not_found(cmd.thread_id))?;

        thread.rename(&cmd.name)?;
        self.threads.update(&thread).await?;
        Ok(thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::chat::test_support::Harness;

    #[tokio::test]
    async fn renames_and_persists_trimmed_name() {
        let h = Harness::subscribed().await;
        let thread = h.thread().await;

        let renamed = RenameThreadHandler::new(h.threads())
            .handle(RenameThreadCommand {
                thread_id: thread.id(),
                user_id: h.user(),
                name: "  Hydraulic leak at gear bay ".into(),
            })
            .await
            .unwrap();

        assert_eq!(renamed.name(), Some("Hydraulic leak at gear bay"));
        let stored = h.store.find_by_id(&thread.id()).await.unwrap().unwrap();
        assert_eq!(stored.name(), Some("Hydraulic leak at gear bay"));
    }

    #[tokio::test]
    async fn blank_name_is_validation_error() {
        let h = Harness::subscribed().await;
        let thread = h.thread().await;

        let err = RenameThreadHandler::new(h.threads())
            .handle(RenameThreadCommand { thread_id: thread.id(), user_id: h.user(), name: " ".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }
}

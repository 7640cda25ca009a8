//! CreateThreadHandler - Command handler for starting a conversation.

use std::sync::Arc;

use tracing::info;

use crate::application::{AccessValidator, ChatError};
use crate::domain::chat::Thread;
use crate::domain::foundation::{AssistantId, UserId};
use crate::ports::{AssistantProvider, ThreadRepository};

/// Command to start a thread with an assistant.
#[derive(Debug, Clone)]
pub struct CreateThreadCommand {
    pub user_id: UserId,
    pub assistant_id: AssistantId,
}

/// Handler for creating threads.
///
/// Access is validated before the provider conversation is created, so a
/// denied user causes no external side effect.
pub struct CreateThreadHandler {
    threads: Arc<dyn ThreadRepository>,
    validator: Arc<AccessValidator>,
    provider: Arc<dyn AssistantProvider>,
}

impl CreateThreadHandler {
    pub fn new(
        threads: Arc<dyn ThreadRepository>,
        validator: Arc<AccessValidator>,
        provider: Arc<dyn AssistantProvider>,
    ) -> Self {
        Self {
            threads,
            validator,
            provider,
        }
    }

    pub async fn handle(&self, cmd: CreateThreadCommand) -> Result<Thread, ChatError> {
        self.validator.require(&cmd.user_id, &cmd.assistant_id).await?;

        let handle = self.provider.create_conversation().await?;
        let thread = Thread::new(cmd.user_id, cmd.assistant_id, handle);
        self.threads.save(&thread).await?;

        info!(
            thread_id = %thread.id(),
            user_id = %thread.user_id(),
            assistant_id = %thread.assistant_id(),
            "thread created"
        );
        Ok(thread)
    }
}

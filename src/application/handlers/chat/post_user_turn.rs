//! PostUserTurnHandler - Command handler for a user's question.

use std::sync::Arc;

use tracing::debug;

use crate::application::{AccessValidator, ChatError};
use crate::domain::chat::Message;
use crate::domain::foundation::{ProviderThreadHandle, Timestamp, UserId};
use crate::ports::{AssistantProvider, MessageRepository, ThreadRepository, TurnMetadata};

#[derive(Debug, Clone)]
pub struct PostUserTurnCommand {
    pub handle: ProviderThreadHandle,
    pub user_id: UserId,
    pub content: String,
}

pub struct PostUserTurnHandler {
    threads: Arc<dyn ThreadRepository>,
    messages: Arc<dyn MessageRepository>,
    validator: Arc<AccessValidator>,
    provider: Arc<dyn AssistantProvider>,
}

impl PostUserTurnHandler {
    pub fn new(
        threads: Arc<dyn ThreadRepository>,
        messages: Arc<dyn MessageRepository>,
        validator: Arc<AccessValidator>,
        provider: Arc<dyn AssistantProvider>,
    ) -> Self {
        Self {
            threads,
            messages,
            validator,
            provider,
        }
    }

    /// Appends the turn at the provider, then stores it locally.
    ///
    /// The local message is uncategorized until the answer is settled.
    pub async fn handle(&self, cmd: PostUserTurnCommand) -> Result<Message, ChatError> {
        let thread = self
            .threads
            .find_by_handle(&cmd.handle)
            .await?
            .filter(|t| t.is_owned_by(&cmd.user_id))
            .ok_or_else(|| ChatError::thread_not_found(&cmd.handle))?;

        let message = Message::user(thread.id(), cmd.content.as_str())?;

        self.validator
            .require(&cmd.user_id, thread.assistant_id())
            .await?;

        let metadata = TurnMetadata {
            user_id: cmd.user_id.clone(),
            assistant_id: thread.assistant_id().clone(),
        };
        self.provider
            .append_user_turn(&cmd.handle, &cmd.content, &metadata)
            .await?;

        self.messages.append(&message).await?;
        self.threads.touch(&thread.id(), Timestamp::now()).await?;

        debug!(thread_id = %thread.id(), message_id = %message.id(), "user turn posted");
        Ok(message)
    }
}

//! OpenAssistantStreamHandler - Opens the streamed answer to the latest turn.

use std::sync::Arc;

use crate::application::{AssistantStream, ChatError, StreamOrchestrator};
use crate::domain::foundation::{ProviderThreadHandle, UserId};

#[derive(Debug, Clone)]
pub struct OpenAssistantStreamCommand {
    pub handle: ProviderThreadHandle,
    pub user_id: UserId,
}

pub struct OpenAssistantStreamHandler {
    orchestrator: Arc<StreamOrchestrator>,
}

impl OpenAssistantStreamHandler {
    pub fn new(orchestrator: Arc<StreamOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn handle(&self, cmd: OpenAssistantStreamCommand) -> Result<AssistantStream, ChatError> {
        self.orchestrator.open(&cmd.handle, &cmd.user_id).await
    }
}

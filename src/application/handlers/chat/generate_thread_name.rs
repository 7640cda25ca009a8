//! GenerateThreadNameHandler - Names a thread from its conversation.
//!
//! One-shot summarization call. The tokens it spends are metered against
//! the user's subscription like any other turn.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::{AccessValidator, ChatError, UsageAttribution, UsageMeter};
use crate::domain::chat::MAX_THREAD_NAME_LEN;
use crate::domain::foundation::{ProviderThreadHandle, UserId};
use crate::ports::{AssistantProvider, CompletionRequest, PromptRole, ThreadRepository};

/// Longest transcript sent for naming, in characters.
const MAX_TRANSCRIPT_CHARS: usize = 6_000;

const NAMING_PROMPT: &str = "Write a short title, at most six words, for the following \
    aviation maintenance conversation. Reply with the title only, without quotes.";

#[derive(Debug, Clone)]
pub struct GenerateThreadNameCommand {
    pub handle: ProviderThreadHandle,
    pub user_id: UserId,
}

pub struct GenerateThreadNameHandler {
    threads: Arc<dyn ThreadRepository>,
    validator: Arc<AccessValidator>,
    provider: Arc<dyn AssistantProvider>,
    meter: Arc<UsageMeter>,
    model: String,
}

impl GenerateThreadNameHandler {
    pub fn new(
        threads: Arc<dyn ThreadRepository>,
        validator: Arc<AccessValidator>,
        provider: Arc<dyn AssistantProvider>,
        meter: Arc<UsageMeter>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            threads,
            validator,
            provider,
            meter,
            model: model.into(),
        }
    }

    pub async fn handle(&self, cmd: GenerateThreadNameCommand) -> Result<String, ChatError> {
        let mut thread = self
            .threads
            .find_by_handle(&cmd.handle)
            .await?
            .filter(|t| t.is_owned_by(&cmd.user_id))
            .ok_or_else(|| ChatError::thread_not_found(&cmd.handle))?;

        let grant = self
            .validator
            .require(&cmd.user_id, thread.assistant_id())
            .await?;

        let turns = self.provider.list_turns(&cmd.handle).await?;
        let transcript = transcript(&turns);
        if transcript.is_empty() {
            return Err(ChatError::Validation(
                "thread has no turns to summarize".to_string(),
            ));
        }

        let response = self
            .provider
            .complete(
                CompletionRequest::new()
                    .with_model(self.model.clone())
                    .with_system_prompt(NAMING_PROMPT)
                    .with_message(PromptRole::User, transcript)
                    .with_max_tokens(24)
                    .with_temperature(0.3),
            )
            .await?;

        if let Some(usage) = response.usage {
            let attribution = UsageAttribution {
                user_id: cmd.user_id.clone(),
                organization_id: grant.grant.organization_id.clone(),
                subscription_id: Some(grant.grant.subscription_id.clone()),
            };
            if let Err(e) = self
                .meter
                .record(&attribution, &response.model, usage.prompt_tokens, usage.completion_tokens)
                .await
            {
                warn!(thread_id = %thread.id(), error = %e, "failed to meter naming call");
            }
        }

        let name = clean_title(&response.content);
        thread.rename(&name)?;
        self.threads.update(&thread).await?;

        info!(thread_id = %thread.id(), "thread named");
        Ok(name)
    }
}

fn transcript(turns: &[crate::ports::ProviderTurn]) -> String {
    let mut out = String::new();
    for turn in turns {
        let speaker = match turn.role {
            PromptRole::User => "User",
            PromptRole::Assistant => "Assistant",
            PromptRole::System => continue,
        };
        let line = format!("{}: {}\n", speaker, turn.content.trim());
        if out.chars().count() + line.chars().count() > MAX_TRANSCRIPT_CHARS {
            break;
        }
        out.push_str(&line);
    }
    out.trim_end().to_string()
}

/// First line of the answer without quotes, capped at the name limit.
fn clean_title(raw: &str) -> String {
    let line = raw.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let trimmed = line
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim_end_matches('.')
        .trim();
    trimmed.chars().take(MAX_THREAD_NAME_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockCompletion, MockError};
    use crate::application::handlers::chat::test_support::Harness;
    use crate::domain::stream::TokenUsage;
    use crate::ports::TurnMetadata;

    fn handler(h: &Harness) -> GenerateThreadNameHandler {
        GenerateThreadNameHandler::new(h.threads(), h.validator(), h.provider(), h.meter(), "gpt-4o-mini")
    }

    async fn with_question(h: &Harness) -> crate::domain::chat::Thread {
        let thread = h.thread().await;
        let metadata = TurnMetadata { user_id: h.user(), assistant_id: h.assistant() };
        h.provider()
            .append_user_turn(thread.provider_handle(), "PACK 2 trips during climb", &metadata)
            .await
            .unwrap();
        thread
    }

    #[tokio::test]
    async fn names_thread_and_meters_usage() {
        let h = Harness::subscribed().await;
        let thread = with_question(&h).await;
        h.provider.push_completion(MockCompletion::Success {
            content: "\"Pack 2 Trip on Climb.\"\n".into(),
            usage: Some(TokenUsage { prompt_tokens: 30, completion_tokens: 6 }),
        });

        let name = handler(&h)
            .handle(GenerateThreadNameCommand { handle: thread.provider_handle().clone(), user_id: h.user() })
            .await
            .unwrap();

        assert_eq!(name, "Pack 2 Trip on Climb");
        let stored = h.store.find_by_id(&thread.id()).await.unwrap().unwrap();
        assert_eq!(stored.name(), Some("Pack 2 Trip on Climb"));
        assert_eq!(h.ledger.len().await, 2);
        let sent = &h.provider.completion_calls()[0].messages[0].content;
        assert!(sent.contains("User: PACK 2 trips during climb"));
    }

    #[tokio::test]
    async fn empty_conversation_is_validation_error() {
        let h = Harness::subscribed().await;
        let thread = h.thread().await;

        let err = handler(&h)
            .handle(GenerateThreadNameCommand { handle: thread.provider_handle().clone(), user_id: h.user() })
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
        assert!(h.provider.completion_calls().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_upstream_and_keeps_name() {
        let h = Harness::subscribed().await;
        let thread = with_question(&h).await;
        h.provider.push_completion(MockCompletion::Error(MockError::Unavailable { message: "down".into() }));

        let err = handler(&h)
            .handle(GenerateThreadNameCommand { handle: thread.provider_handle().clone(), user_id: h.user() })
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Upstream(_)));
        let stored = h.store.find_by_id(&thread.id()).await.unwrap().unwrap();
        assert!(stored.name().is_none());
    }

    #[tokio::test]
    async fn blank_title_still_meters_spent_tokens() {
        let h = Harness::subscribed().await;
        let thread = with_question(&h).await;
        h.provider.push_completion(MockCompletion::Success {
            content: "\"\"".into(),
            usage: Some(TokenUsage { prompt_tokens: 300, completion_tokens: 2 }),
        });

        let result = handler(&h)
            .handle(GenerateThreadNameCommand { handle: thread.provider_handle().clone(), user_id: h.user() })
            .await;

        assert!(result.is_err());
        assert_eq!(h.ledger.len().await, 2);
        let stored = h.store.find_by_id(&thread.id()).await.unwrap().unwrap();
        assert!(stored.name().is_none());
    }

    #[test]
    fn clean_title_strips_quotes_and_caps_length() {
        assert_eq!(clean_title("  'Bleed leak'  "), "Bleed leak");
        assert_eq!(clean_title("\n\nTitle.\nExtra"), "Title");
        assert_eq!(clean_title(&"x".repeat(500)).chars().count(), MAX_THREAD_NAME_LEN);
    }
}

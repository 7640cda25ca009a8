//! MessageClassifier - assigns a topic category to finished text.
//!
//! Best-effort: one secondary-model call, and any failure or unexpected
//! answer resolves to [`Category::General`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::chat::Category;
use crate::ports::{AssistantProvider, CompletionRequest, PromptRole};

/// Longest text sent for classification, in characters.
const MAX_CLASSIFIED_CHARS: usize = 4_000;

pub struct MessageClassifier {
    provider: Arc<dyn AssistantProvider>,
    model: String,
}

impl MessageClassifier {
    pub fn new(provider: Arc<dyn AssistantProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    fn system_prompt() -> String {
        let labels: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        format!(
            "You classify aviation maintenance conversations. Reply with exactly one \
             of these labels and nothing else: {}. Use \"general\" when none fits.",
            labels.join(", ")
        )
    }

    /// Never fails.
    pub async fn classify(&self, text: &str) -> Category {
        let excerpt: String = text.chars().take(MAX_CLASSIFIED_CHARS).collect();
        let request = CompletionRequest::new()
            .with_model(self.model.clone())
            .with_system_prompt(Self::system_prompt())
            .with_message(PromptRole::User, excerpt)
            .with_max_tokens(5)
            .with_temperature(0.0);

        match self.provider.complete(request).await {
            Ok(response) => match Category::parse_label(&response.content) {
                Some(category) => {
                    debug!(category = %category, "message classified");
                    category
                }
                None => {
                    debug!(answer = %response.content, "unrecognized category label");
                    Category::General
                }
            },
            Err(e) => {
                warn!(error = %e, "classification call failed");
                Category::General
            }
        }
    }
}

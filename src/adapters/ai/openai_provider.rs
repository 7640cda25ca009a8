//! OpenAI Provider - Implementation of AssistantProvider for OpenAI's API.
//!
//! Conversations and runs use the Assistants API (v2); classification and
//! naming use chat completions.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_base_url("https://api.openai.com/v1")
//!     .with_default_model("gpt-4o-mini");
//!
//! let provider = OpenAIProvider::new(config)?;
//! ```
//!
//! # Streaming
//!
//! Runs are opened with `stream: true`. The response body is decoded by
//! [`SseDecoder`] and mapped frame by frame to stream events until a
//! terminal event or the `done` frame.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::sse_decoder::{RunEventMapper, SseDecoder};
use crate::domain::foundation::{AssistantId, ProviderThreadHandle, Timestamp};
use crate::domain::stream::TokenUsage;
use crate::ports::{
    AIError, AssistantProvider, CompletionRequest, CompletionResponse, EventStream, PromptRole,
    ProviderTurn, TurnMetadata,
};

/// Most turns fetched when listing a conversation.
const TURN_PAGE_LIMIT: u32 = 100;

/// Configuration for the OpenAI provider.
#[derive(Debug)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Model for completions that do not name one.
    pub default_model: String,
    /// Request timeout for one-shot calls. Streamed runs have none.
    pub timeout: Duration,
    /// Maximum retries on transient failures of one-shot calls.
    pub max_retries: u32,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: "https://api.openai.com/v1".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }

    /// Builds a configuration around an already wrapped key.
    pub fn from_secret(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            ..Self::new(String::new())
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a new OpenAI provider with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Common headers for Assistants API calls.
    fn assistants(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(self.config.api_key())
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn send(&self, builder: RequestBuilder, timeout: Option<Duration>) -> Result<Response, AIError> {
        let builder = match timeout {
            Some(t) => builder.timeout(t),
            None => builder,
        };
        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        Self::check_status(response).await
    }

    fn transport_error(&self, e: reqwest::Error) -> AIError {
        if e.is_timeout() {
            AIError::Timeout {
                timeout_secs: self.config.timeout.as_secs() as u32,
            }
        } else if e.is_connect() {
            AIError::network(format!("connection failed: {}", e))
        } else {
            AIError::network(e.to_string())
        }
    }

    /// Maps non-success statuses to provider errors.
    async fn check_status(response: Response) -> Result<Response, AIError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(AIError::AuthenticationFailed),
            404 => Err(AIError::NotFound(error_message(&body))),
            429 => Err(AIError::rate_limited(Self::parse_retry_after(&body))),
            400 | 409 | 422 => Err(AIError::InvalidRequest(error_message(&body))),
            500..=599 => Err(AIError::unavailable(format!(
                "server error {}: {}",
                status,
                error_message(&body)
            ))),
            _ => Err(AIError::network(format!("unexpected status {}: {}", status, body))),
        }
    }

    /// Parses retry-after from an error body, defaulting to 30 seconds.
    fn parse_retry_after(error_body: &str) -> u32 {
        let message = error_message(error_body);
        if let Some(idx) = message.find("try again in ") {
            let rest = &message[idx + 13..];
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            if let Ok(secs) = digits.parse::<u32>() {
                return secs;
            }
        }
        30
    }

    async fn json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, AIError> {
        response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("failed to parse response: {}", e)))
    }

    fn to_chat_request(&self, request: &CompletionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(prompt) = &request.system_prompt {
            messages.push(ChatMessage {
                role: PromptRole::System,
                content: prompt.clone(),
            });
        }
        messages.extend(request.messages.iter().map(|m| ChatMessage {
            role: m.role,
            content: m.content.clone(),
        }));

        ChatRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.default_model.clone()),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    async fn complete_once(&self, body: &ChatRequest) -> Result<CompletionResponse, AIError> {
        let response = self
            .send(
                self.client
                    .post(self.url("/chat/completions"))
                    .bearer_auth(self.config.api_key())
                    .json(body),
                Some(self.config.timeout),
            )
            .await?;
        let parsed: ChatResponse = Self::json(response).await?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("no choices in response"))?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            }),
            model: parsed.model,
        })
    }
}

#[async_trait]
impl AssistantProvider for OpenAIProvider {
    async fn create_conversation(&self) -> Result<ProviderThreadHandle, AIError> {
        let response = self
            .send(
                self.assistants(self.client.post(self.url("/threads")))
                    .json(&serde_json::json!({})),
                Some(self.config.timeout),
            )
            .await?;
        let created: IdObject = Self::json(response).await?;
        ProviderThreadHandle::new(created.id)
            .map_err(|e| AIError::parse(format!("invalid thread id: {}", e)))
    }

    async fn append_user_turn(
        &self,
        handle: &ProviderThreadHandle,
        content: &str,
        metadata: &TurnMetadata,
    ) -> Result<(), AIError> {
        let body = NewMessage {
            role: "user",
            content,
            metadata,
        };
        self.send(
            self.assistants(
                self.client
                    .post(self.url(&format!("/threads/{}/messages", handle))),
            )
            .json(&body),
            Some(self.config.timeout),
        )
        .await?;
        Ok(())
    }

    async fn open_run(
        &self,
        handle: &ProviderThreadHandle,
        assistant_id: &AssistantId,
    ) -> Result<EventStream, AIError> {
        let body = NewRun {
            assistant_id: assistant_id.as_str(),
            stream: true,
        };
        let response = self
            .send(
                self.assistants(self.client.post(self.url(&format!("/threads/{}/runs", handle))))
                    .header("Accept", "text/event-stream")
                    .json(&body),
                None,
            )
            .await?;
        debug!(handle = %handle, assistant_id = %assistant_id, "provider run opened");

        let stream = async_stream::stream! {
            let mut bytes = Box::pin(response.bytes_stream());
            let mut decoder = SseDecoder::new();
            let mut mapper = RunEventMapper::new();

            'read: loop {
                let (frames, eof) = match bytes.next().await {
                    None => (decoder.finish().into_iter().collect::<Vec<_>>(), true),
                    Some(Err(e)) => {
                        yield Err(AIError::network(format!("stream error: {}", e)));
                        break 'read;
                    }
                    Some(Ok(chunk)) => (decoder.push(&chunk), false),
                };

                for frame in frames {
                    if frame.event.as_deref() == Some("done") {
                        break 'read;
                    }
                    match mapper.map(&frame) {
                        Ok(events) => {
                            for event in events {
                                let terminal = event.is_terminal();
                                yield Ok(event);
                                if terminal {
                                    break 'read;
                                }
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "dropping malformed run frame");
                        }
                    }
                }

                if eof {
                    break 'read;
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn list_turns(&self, handle: &ProviderThreadHandle) -> Result<Vec<ProviderTurn>, AIError> {
        let response = self
            .send(
                self.assistants(
                    self.client
                        .get(self.url(&format!("/threads/{}/messages", handle)))
                        .query(&[("order", "asc"), ("limit", &TURN_PAGE_LIMIT.to_string())]),
                ),
                Some(self.config.timeout),
            )
            .await?;
        let page: MessageList = Self::json(response).await?;

        Ok(page
            .data
            .into_iter()
            .map(|m| ProviderTurn {
                role: m.role,
                content: m
                    .content
                    .into_iter()
                    .filter_map(|part| part.text.map(|t| t.value))
                    .collect::<Vec<_>>()
                    .join("\n"),
                created_at: Utc
                    .timestamp_opt(m.created_at, 0)
                    .single()
                    .map(Timestamp::from_datetime)
                    .unwrap_or_else(Timestamp::now),
            })
            .collect())
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let body = self.to_chat_request(&request);
        let mut attempt = 0;

        loop {
            match self.complete_once(&body).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    // Exponential backoff: 1s, 2s, 4s, ...
                    let delay = Duration::from_secs(1 << attempt);
                    warn!(error = %err, attempt, "completion failed, retrying");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Extracts `error.message` from an OpenAI error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: PromptRole,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Debug, Serialize)]
struct NewMessage<'a> {
    role: &'static str,
    content: &'a str,
    metadata: &'a TurnMetadata,
}

#[derive(Debug, Serialize)]
struct NewRun<'a> {
    assistant_id: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
struct ThreadMessage {
    role: PromptRole,
    #[serde(default)]
    content: Vec<ThreadMessageContent>,
    created_at: i64,
}

#[derive(Debug, Deserialize)]
struct ThreadMessageContent {
    #[serde(default)]
    text: Option<ThreadMessageText>,
}

#[derive(Debug, Deserialize)]
struct ThreadMessageText {
    value: String,
}

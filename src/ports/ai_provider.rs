//! Assistant Provider Port - Interface for the hosted-assistant AI service.
//!
//! The provider hosts both the conversation (a provider-side thread addressed
//! by a [`ProviderThreadHandle`]) and the assistant personas. The chat core
//! appends user turns, opens streamed runs, and makes one-shot completions
//! for classification and thread naming.
//!
//! # Design
//!
//! - Streamed runs are an explicit, ordered event stream whose terminal
//!   items are [`StreamEvent::End`] or [`StreamEvent::Error`]
//! - One-shot completions are independent of any provider thread
//! - Error types cover the failure modes the core distinguishes

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::domain::foundation::{AssistantId, ProviderThreadHandle, Timestamp, UserId};
use crate::domain::stream::{StreamEvent, TokenUsage};

/// Ordered events of one assistant run.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, AIError>> + Send>>;

/// Port for the hosted-assistant provider.
#[async_trait]
pub trait AssistantProvider: Send + Sync {
    /// Creates an empty provider-side conversation.
    async fn create_conversation(&self) -> Result<ProviderThreadHandle, AIError>;

    /// Appends a user turn to a provider conversation.
    async fn append_user_turn(
        &self,
        handle: &ProviderThreadHandle,
        content: &str,
        metadata: &TurnMetadata,
    ) -> Result<(), AIError>;

    /// Starts a streamed run of `assistant_id` over the conversation.
    ///
    /// Errors returned here happen before any event is produced. Errors after
    /// that arrive as items of the stream.
    async fn open_run(
        &self,
        handle: &ProviderThreadHandle,
        assistant_id: &AssistantId,
    ) -> Result<EventStream, AIError>;

    /// Lists the conversation's turns, oldest first.
    async fn list_turns(&self, handle: &ProviderThreadHandle) -> Result<Vec<ProviderTurn>, AIError>;

    /// One-shot, non-streaming completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError>;
}

/// Metadata attached to every user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMetadata {
    pub user_id: UserId,
    pub assistant_id: AssistantId,
}

/// A historical turn as stored by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTurn {
    pub role: PromptRole,
    pub content: String,
    pub created_at: Timestamp,
}

/// Role of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// A message in a one-shot completion prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

/// Request for a one-shot completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model override; the adapter's default is used when `None`.
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub messages: Vec<PromptMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new() -> Self {
        Self {
            model: None,
            system_prompt: None,
            messages: Vec::new(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_message(mut self, role: PromptRole, content: impl Into<String>) -> Self {
        self.messages.push(PromptMessage {
            role,
            content: content.into(),
        });
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Response from a one-shot completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: Option<TokenUsage>,
    /// Model that actually served the request.
    pub model: String,
}

/// AI provider errors.
#[derive(Debug, thiserror::Error)]
pub enum AIError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Provider does not know the thread or assistant.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The run itself failed at the provider.
    #[error("run failed ({code}): {message}")]
    RunFailed { code: String, message: String },

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl AIError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn run_failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RunFailed {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Machine-readable code used on `error` stream events.
    pub fn code(&self) -> &str {
        match self {
            AIError::RateLimited { .. } => "rate_limited",
            AIError::Unavailable { .. } => "provider_unavailable",
            AIError::AuthenticationFailed => "authentication_failed",
            AIError::NotFound(_) => "not_found",
            AIError::Network(_) => "network_error",
            AIError::Parse(_) => "parse_error",
            AIError::InvalidRequest(_) => "invalid_request",
            AIError::RunFailed { code, .. } => code,
            AIError::Timeout { .. } => "timeout",
        }
    }

    /// Converts the error into a terminal stream event.
    pub fn to_event(&self) -> StreamEvent {
        StreamEvent::error(self.code(), self.to_string())
    }

    /// Returns true if a fresh user action might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AIError::RateLimited { .. }
                | AIError::Unavailable { .. }
                | AIError::Network(_)
                | AIError::Timeout { .. }
        )
    }
}

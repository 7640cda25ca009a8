//! Scripted assistant provider for tests and local development.
//!
//! Provides a configurable implementation of the AssistantProvider port,
//! allowing the chat pipeline to run without calling a real provider.
//!
//! # Features
//!
//! - Scripted run event sequences, consumed in order
//! - Mid-stream transport failures and open-time failures
//! - Queued one-shot completions
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = ScriptedAssistantProvider::new()
//!     .with_run(ScriptedRun::text("Check the pack valve.", Some(usage)))
//!     .with_completion("environmental");
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::foundation::{AssistantId, ProviderThreadHandle, Timestamp};
use crate::domain::stream::{StreamEvent, TokenUsage};
use crate::ports::{
    AIError, AssistantProvider, CompletionRequest, CompletionResponse, EventStream, PromptRole,
    ProviderTurn, TurnMetadata,
};

/// Model reported by scripted runs and completions.
pub const MOCK_MODEL: &str = "mock-assistant-1";

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    RunFailed { code: String, message: String },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::RunFailed { code, message } => AIError::run_failed(code, message),
        }
    }
}

/// One item of a scripted run.
#[derive(Debug, Clone)]
pub enum ScriptedItem {
    Event(StreamEvent),
    /// A transport failure surfaced as an `Err` item.
    Fail(MockError),
}

/// A scripted run: either refused at open time or a sequence of items.
#[derive(Debug, Clone)]
pub enum ScriptedRun {
    Items(Vec<ScriptedItem>),
    OpenError(MockError),
}

impl ScriptedRun {
    /// A run that streams `text` word by word and ends normally.
    pub fn text(text: &str, usage: Option<TokenUsage>) -> Self {
        let mut items = vec![ScriptedItem::Event(StreamEvent::TextCreated)];
        let words: Vec<&str> = text.split(' ').collect();
        let last = words.len().saturating_sub(1);
        for (i, word) in words.iter().enumerate() {
            let value = if i == last {
                word.to_string()
            } else {
                format!("{} ", word)
            };
            items.push(ScriptedItem::Event(StreamEvent::TextDelta { value }));
        }
        items.push(ScriptedItem::Event(StreamEvent::End {
            model: MOCK_MODEL.to_string(),
            usage,
        }));
        ScriptedRun::Items(items)
    }

    /// A run that emits exactly the given events.
    pub fn events(events: Vec<StreamEvent>) -> Self {
        ScriptedRun::Items(events.into_iter().map(ScriptedItem::Event).collect())
    }

    /// Text that a consumer would accumulate, when the run ends normally.
    fn completed_text(&self) -> Option<String> {
        let items = match self {
            ScriptedRun::Items(items) => items,
            ScriptedRun::OpenError(_) => return None,
        };
        let mut text = String::new();
        for item in items {
            match item {
                ScriptedItem::Event(StreamEvent::TextDelta { value }) => text.push_str(value),
                ScriptedItem::Event(StreamEvent::End { .. }) => return Some(text),
                ScriptedItem::Event(StreamEvent::Error { .. }) | ScriptedItem::Fail(_) => {
                    return None
                }
                ScriptedItem::Event(_) => {}
            }
        }
        None
    }
}

/// A configured one-shot completion.
#[derive(Debug, Clone)]
pub enum MockCompletion {
    Success {
        content: String,
        usage: Option<TokenUsage>,
    },
    Error(MockError),
}

/// Record of a user turn appended to a scripted conversation.
#[derive(Debug, Clone)]
pub struct AppendedTurn {
    pub handle: ProviderThreadHandle,
    pub content: String,
    pub metadata: TurnMetadata,
}

/// Scripted implementation of [`AssistantProvider`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedAssistantProvider {
    runs: Arc<Mutex<VecDeque<ScriptedRun>>>,
    completions: Arc<Mutex<VecDeque<MockCompletion>>>,
    turns: Arc<Mutex<HashMap<ProviderThreadHandle, Vec<ProviderTurn>>>>,
    appended: Arc<Mutex<Vec<AppendedTurn>>>,
    opened_runs: Arc<Mutex<Vec<(ProviderThreadHandle, AssistantId)>>>,
    completion_calls: Arc<Mutex<Vec<CompletionRequest>>>,
    conversations: Arc<AtomicUsize>,
    event_delay: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedAssistantProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a run script.
    pub fn with_run(self, run: ScriptedRun) -> Self {
        lock(&self.runs).push_back(run);
        self
    }

    /// Queues a successful completion.
    pub fn with_completion(self, content: impl Into<String>) -> Self {
        self.with_completion_full(MockCompletion::Success {
            content: content.into(),
            usage: Some(TokenUsage {
                prompt_tokens: 12,
                completion_tokens: 3,
            }),
        })
    }

    pub fn with_completion_full(self, completion: MockCompletion) -> Self {
        lock(&self.completions).push_back(completion);
        self
    }

    /// Sleeps before every streamed item.
    pub fn with_event_delay(mut self, delay: Duration) -> Self {
        self.event_delay = delay;
        self
    }

    /// Queues a run script on an already shared provider.
    pub fn push_run(&self, run: ScriptedRun) {
        lock(&self.runs).push_back(run);
    }

    /// Queues a completion on an already shared provider.
    pub fn push_completion(&self, completion: MockCompletion) {
        lock(&self.completions).push_back(completion);
    }

    pub fn appended_turns(&self) -> Vec<AppendedTurn> {
        lock(&self.appended).clone()
    }

    pub fn opened_runs(&self) -> Vec<(ProviderThreadHandle, AssistantId)> {
        lock(&self.opened_runs).clone()
    }

    pub fn completion_calls(&self) -> Vec<CompletionRequest> {
        lock(&self.completion_calls).clone()
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.load(Ordering::SeqCst)
    }

    fn next_run(&self) -> ScriptedRun {
        lock(&self.runs)
            .pop_front()
            .unwrap_or_else(|| ScriptedRun::text("Mock response", None))
    }

    fn next_completion(&self) -> MockCompletion {
        lock(&self.completions)
            .pop_front()
            .unwrap_or_else(|| MockCompletion::Success {
                content: "general".to_string(),
                usage: Some(TokenUsage {
                    prompt_tokens: 5,
                    completion_tokens: 1,
                }),
            })
    }
}

#[async_trait]
impl AssistantProvider for ScriptedAssistantProvider {
    async fn create_conversation(&self) -> Result<ProviderThreadHandle, AIError> {
        let n = self.conversations.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = ProviderThreadHandle::new(format!("thread_mock_{}", n))
            .map_err(|e| AIError::parse(e.to_string()))?;
        lock(&self.turns).insert(handle.clone(), Vec::new());
        Ok(handle)
    }

    async fn append_user_turn(
        &self,
        handle: &ProviderThreadHandle,
        content: &str,
        metadata: &TurnMetadata,
    ) -> Result<(), AIError> {
        let mut turns = lock(&self.turns);
        let history = turns
            .get_mut(handle)
            .ok_or_else(|| AIError::NotFound(format!("thread {}", handle)))?;
        history.push(ProviderTurn {
            role: PromptRole::User,
            content: content.to_string(),
            created_at: Timestamp::now(),
        });
        lock(&self.appended).push(AppendedTurn {
            handle: handle.clone(),
            content: content.to_string(),
            metadata: metadata.clone(),
        });
        Ok(())
    }

    async fn open_run(
        &self,
        handle: &ProviderThreadHandle,
        assistant_id: &AssistantId,
    ) -> Result<EventStream, AIError> {
        lock(&self.opened_runs).push((handle.clone(), assistant_id.clone()));

        let run = self.next_run();
        if let Some(text) = run.completed_text().filter(|t| !t.is_empty()) {
            if let Some(history) = lock(&self.turns).get_mut(handle) {
                history.push(ProviderTurn {
                    role: PromptRole::Assistant,
                    content: text,
                    created_at: Timestamp::now(),
                });
            }
        }

        let items = match run {
            ScriptedRun::OpenError(err) => return Err(err.into()),
            ScriptedRun::Items(items) => items,
        };

        let delay = self.event_delay;
        let stream = stream::iter(items).then(move |item| async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            match item {
                ScriptedItem::Event(event) => Ok(event),
                ScriptedItem::Fail(err) => Err(AIError::from(err)),
            }
        });
        Ok(Box::pin(stream))
    }

    async fn list_turns(&self, handle: &ProviderThreadHandle) -> Result<Vec<ProviderTurn>, AIError> {
        lock(&self.turns)
            .get(handle)
            .cloned()
            .ok_or_else(|| AIError::NotFound(format!("thread {}", handle)))
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let model = request.model.clone().unwrap_or_else(|| MOCK_MODEL.to_string());
        lock(&self.completion_calls).push(request);

        match self.next_completion() {
            MockCompletion::Success { content, usage } => Ok(CompletionResponse {
                content,
                usage,
                model,
            }),
            MockCompletion::Error(err) => Err(err.into()),
        }
    }
}

//! AI Provider Adapters.
//!
//! Implementations of the AssistantProvider port.
//!
//! ## Available Adapters
//!
//! - `ScriptedAssistantProvider` - Scripted runs and completions for tests and local development
//! - `OpenAIProvider` - OpenAI Assistants API (v2) with chat completions for one-shot calls

mod mock_provider;
mod openai_provider;
mod sse_decoder;

pub use mock_provider::{
    AppendedTurn, MockCompletion, MockError, ScriptedAssistantProvider, ScriptedItem, ScriptedRun,
    MOCK_MODEL,
};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
pub use sse_decoder::{RunEventMapper, SseDecoder, SseFrame};

//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `ThreadRepository` / `MessageRepository` - Conversation store
//! - `UsageLedger` - Append-only token usage records
//! - `EntitlementReader` - Read-only subscription state
//!
//! ## External Service Ports
//!
//! - `AssistantProvider` - Hosted assistants, streamed runs, completions

mod ai_provider;
mod entitlement_reader;
mod message_repository;
mod thread_repository;
mod usage_ledger;

pub use ai_provider::{
    AIError, AssistantProvider, CompletionRequest, CompletionResponse, EventStream, PromptMessage,
    PromptRole, ProviderTurn, TurnMetadata,
};
pub use entitlement_reader::EntitlementReader;
pub use message_repository::MessageRepository;
pub use thread_repository::ThreadRepository;
pub use usage_ledger::UsageLedger;

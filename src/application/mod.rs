//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).
//! Streaming, settlement and metering services sit alongside the handlers.

mod access_validator;
mod classifier;
mod errors;
pub mod handlers;
mod settlement;
mod stream_orchestrator;
mod supervisor;
mod usage_meter;

pub use access_validator::AccessValidator;
pub use classifier::MessageClassifier;
pub use errors::ChatError;
pub use settlement::{
    Settlement, SettlementFailure, SettlementInput, SettlementReport, SettlementStep,
};
pub use stream_orchestrator::{AssistantStream, StreamOrchestrator};
pub use supervisor::TaskSupervisor;
pub use usage_meter::{UsageAttribution, UsageMeter};

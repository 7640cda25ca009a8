//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, the timestamp value object, and the error types
//! that form the vocabulary of the chat domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    AssistantId, LedgerEntryId, MessageId, OrganizationId, ProductId, ProviderThreadHandle,
    SubscriptionId, ThreadId, UserId,
};
pub use timestamp::Timestamp;

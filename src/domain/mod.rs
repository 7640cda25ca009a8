//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamp, errors)
//! - `catalog` - Static assistant catalog
//! - `entitlement` - Subscription read model and access policy
//! - `chat` - Threads, messages and topic categories
//! - `usage` - Token ledger and pricing
//! - `stream` - Assistant run events

pub mod catalog;
pub mod chat;
pub mod entitlement;
pub mod foundation;
pub mod stream;
pub mod usage;

//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! This module provides adapters for PostgreSQL-backed persistence:
//! - `PostgresThreadRepository` - Chat threads
//! - `PostgresMessageRepository` - Chat messages, ordered by insertion
//! - `PostgresUsageLedger` - Append-only token usage
//! - `PostgresEntitlementReader` - Read model over billing subscriptions

mod entitlement_reader;
mod message_repository;
mod thread_repository;
mod usage_ledger;

pub use entitlement_reader::PostgresEntitlementReader;
pub use message_repository::PostgresMessageRepository;
pub use thread_repository::PostgresThreadRepository;
pub use usage_ledger::PostgresUsageLedger;

//! In-memory adapters for every persistence port.
//!
//! Used by development builds without a database and by tests.

mod chat_store;
mod entitlement_store;
mod usage_ledger;

pub use chat_store::InMemoryChatStore;
pub use entitlement_store::InMemoryEntitlementStore;
pub use usage_ledger::InMemoryUsageLedger;

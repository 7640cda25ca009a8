//! Usage domain module - token ledger and pricing.

mod ledger;
mod pricing;

pub use ledger::{PricedEntry, TokenKind, UsageLedgerEntry, UsageTotals};
pub use pricing::{Cost, ModelPrice, PricingTable, DEFAULT as DEFAULT_PRICING};

//! UsageLedger port - Append-only token usage records.
//!
//! Rows carry token counts only. Cost is computed by the reader against the
//! current pricing table.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use crate::domain::usage::UsageLedgerEntry;

#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Appends rows. Rows are never updated afterwards.
    async fn append(&self, entries: &[UsageLedgerEntry]) -> Result<(), DomainError>;

    /// Sum of tokens recorded for the user under a subscription since `since`.
    async fn tokens_since(
        &self,
        user_id: &UserId,
        subscription_id: &SubscriptionId,
        since: Timestamp,
    ) -> Result<u64, DomainError>;

    /// Rows recorded for the user since `since`, oldest first.
    async fn list_since(&self, user_id: &UserId, since: Timestamp) -> Result<Vec<UsageLedgerEntry>, DomainError>;
}

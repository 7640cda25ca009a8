//! In-memory usage ledger.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use crate::domain::usage::UsageLedgerEntry;
use crate::ports::UsageLedger;

/// Append-only ledger held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUsageLedger {
    entries: Arc<RwLock<Vec<UsageLedgerEntry>>>,
}

impl InMemoryUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded rows.
    pub async fn entries(&self) -> Vec<UsageLedgerEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl UsageLedger for InMemoryUsageLedger {
    async fn append(&self, entries: &[UsageLedgerEntry]) -> Result<(), DomainError> {
        self.entries.write().await.extend_from_slice(entries);
        Ok(())
    }

    async fn tokens_since(
        &self,
        user_id: &UserId,
        subscription_id: &SubscriptionId,
        since: Timestamp,
    ) -> Result<u64, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| {
                &e.user_id == user_id
                    && e.subscription_id.as_ref() == Some(subscription_id)
                    && e.occurred_at >= since
            })
            .map(|e| e.tokens)
            .sum())
    }

    async fn list_since(
        &self,
        user_id: &UserId,
        since: Timestamp,
    ) -> Result<Vec<UsageLedgerEntry>, DomainError> {
        let entries = self.entries.read().await;
        let mut rows: Vec<UsageLedgerEntry> = entries
            .iter()
            .filter(|e| &e.user_id == user_id && e.occurred_at >= since)
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.occurred_at);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::usage::TokenKind;

    fn entry(user: &str, sub: Option<&str>, tokens: u64, at: Timestamp) -> UsageLedgerEntry {
        UsageLedgerEntry::new(
            UserId::new(user).unwrap(),
            None,
            sub.map(|s| SubscriptionId::new(s).unwrap()),
            "gpt-4o",
            TokenKind::Input,
            tokens,
            at,
        )
    }

    #[tokio::test]
    async fn tokens_since_scopes_by_user_subscription_and_time() {
        let ledger = InMemoryUsageLedger::new();
        let now = Timestamp::now();
        ledger
            .append(&[
                entry("user-1", Some("sub_1"), 100, now),
                entry("user-1", Some("sub_1"), 50, now.minus_days(40)),
                entry("user-1", Some("sub_2"), 7, now),
                entry("user-1", None, 3, now),
                entry("user-2", Some("sub_1"), 1000, now),
            ])
            .await
            .unwrap();

        let used = ledger
            .tokens_since(
                &UserId::new("user-1").unwrap(),
                &SubscriptionId::new("sub_1").unwrap(),
                now.minus_days(1),
            )
            .await
            .unwrap();
        assert_eq!(used, 100);
    }

    #[tokio::test]
    async fn list_since_returns_user_rows_oldest_first() {
        let ledger = InMemoryUsageLedger::new();
        let now = Timestamp::now();
        ledger
            .append(&[
                entry("user-1", None, 2, now),
                entry("user-1", None, 1, now.minus_days(1)),
                entry("user-2", None, 9, now),
            ])
            .await
            .unwrap();

        let rows = ledger
            .list_since(&UserId::new("user-1").unwrap(), now.minus_days(2))
            .await
            .unwrap();
        assert_eq!(rows.iter().map(|r| r.tokens).collect::<Vec<_>>(), vec![1, 2]);
    }
}

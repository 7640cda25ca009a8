//! UsageMeter - converts token counts into ledger rows and prices them.
//!
//! Rows are written without cost. Pricing happens at read time against the
//! injected table, so a corrected table reprices history without touching
//! stored rows.

use std::sync::Arc;

use tracing::debug;

use crate::domain::foundation::{DomainError, OrganizationId, SubscriptionId, Timestamp, UserId};
use crate::domain::usage::{Cost, PricedEntry, PricingTable, TokenKind, UsageLedgerEntry};
use crate::ports::UsageLedger;

/// Who a metered call is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageAttribution {
    pub user_id: UserId,
    pub organization_id: Option<OrganizationId>,
    pub subscription_id: Option<SubscriptionId>,
}

pub struct UsageMeter {
    ledger: Arc<dyn UsageLedger>,
    pricing: Arc<PricingTable>,
}

impl UsageMeter {
    pub fn new(ledger: Arc<dyn UsageLedger>, pricing: Arc<PricingTable>) -> Self {
        Self { ledger, pricing }
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Appends one input row and one output row.
    pub async fn record(
        &self,
        attribution: &UsageAttribution,
        model: &str,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Result<Vec<UsageLedgerEntry>, DomainError> {
        let now = Timestamp::now();
        let entries = vec![
            UsageLedgerEntry::new(
                attribution.user_id.clone(),
                attribution.organization_id.clone(),
                attribution.subscription_id.clone(),
                model,
                TokenKind::Input,
                input_tokens,
                now,
            ),
            UsageLedgerEntry::new(
                attribution.user_id.clone(),
                attribution.organization_id.clone(),
                attribution.subscription_id.clone(),
                model,
                TokenKind::Output,
                output_tokens,
                now,
            ),
        ];
        self.ledger.append(&entries).await?;
        debug!(
            user_id = %attribution.user_id,
            model,
            input_tokens,
            output_tokens,
            "usage recorded"
        );
        Ok(entries)
    }

    pub fn cost_of(&self, model: &str, kind: TokenKind, tokens: u64) -> Cost {
        self.pricing.cost_of(model, kind, tokens)
    }

    /// Attaches current costs to historical rows.
    pub fn price_entries(&self, entries: Vec<UsageLedgerEntry>) -> Vec<PricedEntry> {
        entries
            .into_iter()
            .map(|entry| {
                let cost = self.cost_of(&entry.model, entry.kind, entry.tokens);
                PricedEntry { entry, cost }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryUsageLedger;
    use crate::domain::usage::{ModelPrice, DEFAULT_PRICING};
    use std::collections::BTreeMap;

    fn attribution() -> UsageAttribution {
        UsageAttribution {
            user_id: UserId::new("user-1").unwrap(),
            organization_id: Some(OrganizationId::new("org-1").unwrap()),
            subscription_id: Some(SubscriptionId::new("sub_1").unwrap()),
        }
    }

    #[tokio::test]
    async fn record_writes_input_and_output_rows() {
        let ledger = InMemoryUsageLedger::new();
        let meter = UsageMeter::new(Arc::new(ledger.clone()), Arc::new(DEFAULT_PRICING.clone()));

        meter.record(&attribution(), "gpt-4o", 120, 45).await.unwrap();

        let rows = ledger.entries().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, TokenKind::Input);
        assert_eq!(rows[0].tokens, 120);
        assert_eq!(rows[1].kind, TokenKind::Output);
        assert_eq!(rows[1].tokens, 45);
        assert_eq!(rows[1].organization_id.as_ref().unwrap().as_str(), "org-1");
    }

    #[tokio::test]
    async fn repricing_changes_cost_without_touching_rows() {
        let ledger = InMemoryUsageLedger::new();
        let old = UsageMeter::new(Arc::new(ledger.clone()), Arc::new(DEFAULT_PRICING.clone()));
        old.record(&attribution(), "gpt-4o", 1000, 0).await.unwrap();

        let rows_before = ledger.entries().await;
        let old_cost = old.price_entries(rows_before.clone())[0].cost;

        let mut models = BTreeMap::new();
        models.insert(
            "gpt-4o".to_string(),
            ModelPrice { input_cents_per_million: 500, output_cents_per_million: 1000 },
        );
        let corrected = PricingTable {
            version: "2024-09".to_string(),
            models,
            fallback: DEFAULT_PRICING.fallback,
        };
        let new = UsageMeter::new(Arc::new(ledger.clone()), Arc::new(corrected));
        let new_cost = new.price_entries(ledger.entries().await)[0].cost;

        assert_eq!(new_cost.micro_cents(), old_cost.micro_cents() * 2);
        assert_eq!(ledger.entries().await, rows_before);
    }
}

//! GetUsageHandler - Current-period usage with costs priced at read time.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::application::{ChatError, UsageMeter};
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::usage::{PricedEntry, UsageTotals};
use crate::ports::{EntitlementReader, UsageLedger};

#[derive(Debug, Clone)]
pub struct GetUsageQuery {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub period_start: NaiveDate,
    pub reset_date: NaiveDate,
    pub pricing_version: String,
    /// `None` when unlimited or without a subscription.
    pub allowance: Option<u64>,
    pub totals: UsageTotals,
    pub entries: Vec<PricedEntry>,
}

pub struct GetUsageHandler {
    ledger: Arc<dyn UsageLedger>,
    entitlements: Arc<dyn EntitlementReader>,
    meter: Arc<UsageMeter>,
}

impl GetUsageHandler {
    pub fn new(
        ledger: Arc<dyn UsageLedger>,
        entitlements: Arc<dyn EntitlementReader>,
        meter: Arc<UsageMeter>,
    ) -> Self {
        Self {
            ledger,
            entitlements,
            meter,
        }
    }

    pub async fn handle(&self, query: GetUsageQuery) -> Result<UsageReport, ChatError> {
        let now = Timestamp::now();
        let since = now.start_of_month();

        let rows = self.ledger.list_since(&query.user_id, since).await?;
        let entries = self.meter.price_entries(rows);
        let totals = UsageTotals::from_priced(&entries);

        let allowance = self
            .entitlements
            .get_active_grant(&query.user_id)
            .await?
            .filter(|g| g.is_active_at(&now))
            .and_then(|g| g.token_allowance.limit());

        Ok(UsageReport {
            period_start: since.date(),
            reset_date: now.start_of_next_month().date(),
            pricing_version: self.meter.pricing().version.clone(),
            allowance,
            totals,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::chat::test_support::Harness;

    #[tokio::test]
    async fn prices_current_period_rows() {
        let h = Harness::subscribed_with_allowance(5_000).await;
        h.consume(1_000).await;

        let report = GetUsageHandler::new(h.ledger_port(), h.entitlement_port(), h.meter())
            .handle(GetUsageQuery { user_id: h.user() })
            .await
            .unwrap();

        assert_eq!(report.allowance, Some(5_000));
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.totals.input_tokens, 1_000);
        assert_eq!(report.totals.cost.micro_cents(), 1_000 * 250);
        assert_eq!(report.pricing_version, "2024-08");
        assert!(report.reset_date > report.period_start);
    }
}

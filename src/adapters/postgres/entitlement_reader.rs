//! PostgreSQL implementation of EntitlementReader.
//!
//! Reads the `subscriptions` table maintained by the billing integration.
//! This service never writes it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entitlement::{
    BillingInterval, EntitlementGrant, SubscriptionStatus, TokenAllowance,
};
use crate::domain::foundation::{
    DomainError, ErrorCode, OrganizationId, ProductId, SubscriptionId, Timestamp, UserId,
};
use crate::ports::{EntitlementReader, UsageLedger};

use super::PostgresUsageLedger;

/// PostgreSQL implementation of the EntitlementReader port.
pub struct PostgresEntitlementReader {
    pool: PgPool,
    ledger: PostgresUsageLedger,
}

impl PostgresEntitlementReader {
    pub fn new(pool: PgPool) -> Self {
        Self {
            ledger: PostgresUsageLedger::new(pool.clone()),
            pool,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: String,
    user_id: String,
    organization_id: Option<String>,
    status: String,
    billing_interval: String,
    product_ids: Vec<String>,
    token_allowance: Option<i64>,
    current_period_end: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriptionRow> for EntitlementGrant {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, e: String| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid {}: {}", field, e))
        };
        let products = row
            .product_ids
            .into_iter()
            .map(ProductId::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| corrupt("product_ids", e.to_string()))?;

        Ok(EntitlementGrant {
            subscription_id: SubscriptionId::new(row.id).map_err(|e| corrupt("id", e.to_string()))?,
            user_id: UserId::new(row.user_id).map_err(|e| corrupt("user_id", e.to_string()))?,
            organization_id: row
                .organization_id
                .map(OrganizationId::new)
                .transpose()
                .map_err(|e| corrupt("organization_id", e.to_string()))?,
            status: row
                .status
                .parse::<SubscriptionStatus>()
                .map_err(|e| corrupt("status", e.to_string()))?,
            interval: row
                .billing_interval
                .parse::<BillingInterval>()
                .map_err(|e| corrupt("billing_interval", e.to_string()))?,
            products,
            token_allowance: TokenAllowance::from_optional(row.token_allowance),
            ends_at: row.current_period_end.map(Timestamp::from_datetime),
        })
    }
}

#[async_trait]
impl EntitlementReader for PostgresEntitlementReader {
    async fn get_active_grant(
        &self,
        user_id: &UserId,
    ) -> Result<Option<EntitlementGrant>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, organization_id, status, billing_interval,
                   product_ids, token_allowance, current_period_end
            FROM subscriptions
            WHERE user_id = $1
              AND status = 'active'
              AND (current_period_end IS NULL OR current_period_end > NOW())
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch subscription: {}", e)))?;

        row.map(EntitlementGrant::try_from).transpose()
    }

    async fn period_usage(
        &self,
        user_id: &UserId,
        subscription_id: &SubscriptionId,
        since: Timestamp,
    ) -> Result<u64, DomainError> {
        self.ledger.tokens_since(user_id, subscription_id, since).await
    }
}

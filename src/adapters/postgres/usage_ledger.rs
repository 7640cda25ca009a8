//! PostgreSQL implementation of UsageLedger.
//!
//! Append-only: rows are never updated or deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, LedgerEntryId, OrganizationId, SubscriptionId, Timestamp, UserId,
};
use crate::domain::usage::{TokenKind, UsageLedgerEntry};
use crate::ports::UsageLedger;

/// PostgreSQL implementation of UsageLedger.
#[derive(Clone)]
pub struct PostgresUsageLedger {
    pool: PgPool,
}

impl PostgresUsageLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: Uuid,
    user_id: String,
    organization_id: Option<String>,
    subscription_id: Option<String>,
    model: String,
    kind: String,
    tokens: i64,
    occurred_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for UsageLedgerEntry {
    type Error = DomainError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, e: String| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid {}: {}", field, e))
        };
        Ok(UsageLedgerEntry {
            id: LedgerEntryId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| corrupt("user_id", e.to_string()))?,
            organization_id: row
                .organization_id
                .map(OrganizationId::new)
                .transpose()
                .map_err(|e| corrupt("organization_id", e.to_string()))?,
            subscription_id: row
                .subscription_id
                .map(SubscriptionId::new)
                .transpose()
                .map_err(|e| corrupt("subscription_id", e.to_string()))?,
            model: row.model,
            kind: row
                .kind
                .parse::<TokenKind>()
                .map_err(|e| corrupt("kind", e.to_string()))?,
            tokens: u64::try_from(row.tokens).map_err(|e| corrupt("tokens", e.to_string()))?,
            occurred_at: Timestamp::from_datetime(row.occurred_at),
        })
    }
}

fn to_i64(tokens: u64) -> Result<i64, DomainError> {
    i64::try_from(tokens).map_err(|_| {
        DomainError::new(
            ErrorCode::ValidationFailed,
            format!("Token count out of range: {}", tokens),
        )
    })
}

#[async_trait]
impl UsageLedger for PostgresUsageLedger {
    async fn append(&self, entries: &[UsageLedgerEntry]) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to begin transaction: {}", e)))?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO usage_ledger (
                    id, user_id, organization_id, subscription_id,
                    model, kind, tokens, occurred_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(entry.id.as_uuid())
            .bind(entry.user_id.as_str())
            .bind(entry.organization_id.as_ref().map(|o| o.as_str()))
            .bind(entry.subscription_id.as_ref().map(|s| s.as_str()))
            .bind(&entry.model)
            .bind(entry.kind.as_str())
            .bind(to_i64(entry.tokens)?)
            .bind(entry.occurred_at.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database(format!("Failed to insert usage: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit usage: {}", e)))?;

        Ok(())
    }

    async fn tokens_since(
        &self,
        user_id: &UserId,
        subscription_id: &SubscriptionId,
        since: Timestamp,
    ) -> Result<u64, DomainError> {
        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(tokens), 0)::BIGINT
            FROM usage_ledger
            WHERE user_id = $1 AND subscription_id = $2 AND occurred_at >= $3
            "#,
        )
        .bind(user_id.as_str())
        .bind(subscription_id.as_str())
        .bind(since.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to sum usage: {}", e)))?;

        Ok(total.0.max(0) as u64)
    }

    async fn list_since(
        &self,
        user_id: &UserId,
        since: Timestamp,
    ) -> Result<Vec<UsageLedgerEntry>, DomainError> {
        let rows: Vec<LedgerRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, organization_id, subscription_id,
                   model, kind, tokens, occurred_at
            FROM usage_ledger
            WHERE user_id = $1 AND occurred_at >= $2
            ORDER BY occurred_at ASC, id ASC
            "#,
        )
        .bind(user_id.as_str())
        .bind(since.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list usage: {}", e)))?;

        rows.into_iter().map(UsageLedgerEntry::try_from).collect()
    }
}

//! Usage ledger entries.
//!
//! Ledger rows are immutable historical facts. They record token counts
//! only; cost is derived at read time from a pricing table.

use serde::{Deserialize, Serialize};

use super::pricing::Cost;
use crate::domain::foundation::{
    LedgerEntryId, OrganizationId, SubscriptionId, Timestamp, UserId, ValidationError,
};

/// Which side of a model call the tokens were billed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Input,
    Output,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Input => "input",
            TokenKind::Output => "output",
        }
    }
}

impl std::str::FromStr for TokenKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(TokenKind::Input),
            "output" => Ok(TokenKind::Output),
            other => Err(ValidationError::invalid_format(
                "kind",
                format!("unknown token kind '{}'", other),
            )),
        }
    }
}

/// One token-usage record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLedgerEntry {
    pub id: LedgerEntryId,
    pub user_id: UserId,
    pub organization_id: Option<OrganizationId>,
    pub subscription_id: Option<SubscriptionId>,
    pub model: String,
    pub kind: TokenKind,
    pub tokens: u64,
    pub occurred_at: Timestamp,
}

impl UsageLedgerEntry {
    pub fn new(
        user_id: UserId,
        organization_id: Option<OrganizationId>,
        subscription_id: Option<SubscriptionId>,
        model: impl Into<String>,
        kind: TokenKind,
        tokens: u64,
        occurred_at: Timestamp,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            user_id,
            organization_id,
            subscription_id,
            model: model.into(),
            kind,
            tokens,
            occurred_at,
        }
    }
}

/// A ledger row with its cost attached at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedEntry {
    #[serde(flatten)]
    pub entry: UsageLedgerEntry,
    pub cost: Cost,
}

/// Aggregates over a set of priced rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: Cost,
}

impl UsageTotals {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn from_priced(entries: &[PricedEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut acc, priced| {
            match priced.entry.kind {
                TokenKind::Input => acc.input_tokens += priced.entry.tokens,
                TokenKind::Output => acc.output_tokens += priced.entry.tokens,
            }
            acc.cost = acc.cost + priced.cost;
            acc
        })
    }
}

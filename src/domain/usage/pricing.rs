//! Versioned pricing table.
//!
//! Prices are expressed in cents per million tokens, so the cost of `n`
//! tokens is `n * price` micro-cents and stays an exact integer.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Add;

use super::ledger::TokenKind;
use crate::domain::foundation::ValidationError;

/// A monetary amount in millionths of a cent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cost(u64);

impl Cost {
    pub const ZERO: Cost = Cost(0);

    pub fn from_micro_cents(micro_cents: u64) -> Self {
        Self(micro_cents)
    }

    pub fn micro_cents(&self) -> u64 {
        self.0
    }

    /// Whole cents, rounded down.
    pub fn cents(&self) -> u64 {
        self.0 / 1_000_000
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost(self.0.saturating_add(rhs.0))
    }
}

/// Price of one model, per token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPrice {
    pub input_cents_per_million: u64,
    pub output_cents_per_million: u64,
}

impl ModelPrice {
    pub fn per_million(&self, kind: TokenKind) -> u64 {
        match kind {
            TokenKind::Input => self.input_cents_per_million,
            TokenKind::Output => self.output_cents_per_million,
        }
    }
}

/// Model-keyed price list with a fallback for unknown models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTable {
    pub version: String,
    pub models: BTreeMap<String, ModelPrice>,
    pub fallback: ModelPrice,
}

impl PricingTable {
    /// Parses a pricing table from YAML.
    pub fn from_yaml(source: &str) -> Result<Self, ValidationError> {
        let table: PricingTable = serde_yaml::from_str(source)
            .map_err(|e| ValidationError::invalid_format("pricing", e.to_string()))?;
        if table.version.trim().is_empty() {
            return Err(ValidationError::empty_field("version"));
        }
        Ok(table)
    }

    /// Resolves the price for a model: exact match, then the longest key
    /// that prefixes the model, then the fallback.
    ///
    /// Prefix matching lets dated snapshots such as `gpt-4o-2024-08-06`
    /// inherit the price of `gpt-4o`.
    pub fn price_for(&self, model: &str) -> &ModelPrice {
        if let Some(price) = self.models.get(model) {
            return price;
        }
        self.models
            .iter()
            .filter(|(key, _)| model.starts_with(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, price)| price)
            .unwrap_or(&self.fallback)
    }

    /// Cost of `tokens` tokens of `kind` on `model`.
    pub fn cost_of(&self, model: &str, kind: TokenKind, tokens: u64) -> Cost {
        let per_million = self.price_for(model).per_million(kind);
        Cost(tokens.saturating_mul(per_million))
    }
}

const DEFAULT_PRICING: &str = r#"
version: "2024-08"
models:
  gpt-4o:
    input_cents_per_million: 250
    output_cents_per_million: 1000
  gpt-4o-mini:
    input_cents_per_million: 15
    output_cents_per_million: 60
  gpt-4-turbo:
    input_cents_per_million: 1000
    output_cents_per_million: 3000
  gpt-3.5-turbo:
    input_cents_per_million: 50
    output_cents_per_million: 150
fallback:
  input_cents_per_million: 1000
  output_cents_per_million: 3000
"#;

/// Pricing used when no pricing file is configured.
pub static DEFAULT: Lazy<PricingTable> = Lazy::new(|| {
    PricingTable::from_yaml(DEFAULT_PRICING).unwrap_or_else(|_| PricingTable {
        version: "fallback".to_string(),
        models: BTreeMap::new(),
        fallback: ModelPrice {
            input_cents_per_million: 1000,
            output_cents_per_million: 3000,
        },
    })
});

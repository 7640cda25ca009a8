//! Entitlement read model.
//!
//! A resolved view of a user's subscription as maintained by the billing
//! subsystem. The chat core never writes these records.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::{
    OrganizationId, ProductId, SubscriptionId, Timestamp, UserId, ValidationError,
};

/// Subscription status as reported by billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "cancelled" | "canceled" => Ok(SubscriptionStatus::Cancelled),
            "expired" => Ok(SubscriptionStatus::Expired),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown subscription status '{}'", other),
            )),
        }
    }
}

/// Billing interval of the subscription's price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingInterval {
    Monthly,
    Annual,
}

impl FromStr for BillingInterval {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "month" | "monthly" => Ok(BillingInterval::Monthly),
            "year" | "annual" | "yearly" => Ok(BillingInterval::Annual),
            other => Err(ValidationError::invalid_format(
                "interval",
                format!("unknown billing interval '{}'", other),
            )),
        }
    }
}

/// Tokens a subscription may consume per calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tokens", rename_all = "snake_case")]
pub enum TokenAllowance {
    Unlimited,
    Limited(u64),
}

impl TokenAllowance {
    /// Builds an allowance from a nullable column where `NULL` means unlimited.
    pub fn from_optional(tokens: Option<i64>) -> Self {
        match tokens {
            Some(n) => TokenAllowance::Limited(n.max(0) as u64),
            None => TokenAllowance::Unlimited,
        }
    }

    pub fn limit(&self) -> Option<u64> {
        match self {
            TokenAllowance::Unlimited => None,
            TokenAllowance::Limited(n) => Some(*n),
        }
    }
}

/// A user's resolved subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementGrant {
    pub subscription_id: SubscriptionId,
    pub user_id: UserId,
    pub organization_id: Option<OrganizationId>,
    pub status: SubscriptionStatus,
    pub interval: BillingInterval,
    pub products: Vec<ProductId>,
    pub token_allowance: TokenAllowance,
    pub ends_at: Option<Timestamp>,
}

impl EntitlementGrant {
    /// Active means status is `active` and the subscription has not ended.
    pub fn is_active_at(&self, now: &Timestamp) -> bool {
        self.status == SubscriptionStatus::Active
            && self.ends_at.map_or(true, |end| end.is_after(now))
    }

    pub fn includes(&self, product: &ProductId) -> bool {
        self.products.iter().any(|p| p == product)
    }
}

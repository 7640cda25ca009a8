//! Access decisions: a positive grant or a denial with remediation hints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::grant::{BillingInterval, EntitlementGrant, SubscriptionStatus, TokenAllowance};
use crate::domain::foundation::{AssistantId, ProductId, SubscriptionId};

/// What the caller should offer the user to resolve a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Remediation {
    Subscribe,
    Upgrade,
    PurchaseTokens,
}

/// Why access was denied.
///
/// The three reasons are mutually exclusive and checked in order:
/// subscription, product, allowance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    /// No active subscription.
    NoSubscription {
        /// The required product, or every catalog product when the
        /// assistant is unknown.
        suggested_products: Vec<ProductId>,
    },

    /// Subscription exists but does not include the assistant's product.
    ProductNotIncluded { current_products: Vec<ProductId> },

    /// Period allowance consumed.
    TokenLimitExceeded {
        used: u64,
        allowance: u64,
        reset_date: NaiveDate,
    },
}

impl DenialReason {
    pub fn remediation(&self) -> Remediation {
        match self {
            DenialReason::NoSubscription { .. } => Remediation::Subscribe,
            DenialReason::ProductNotIncluded { .. } => Remediation::Upgrade,
            DenialReason::TokenLimitExceeded { .. } => Remediation::PurchaseTokens,
        }
    }

    /// Machine-readable code matching the serialized tag.
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::NoSubscription { .. } => "NO_SUBSCRIPTION",
            DenialReason::ProductNotIncluded { .. } => "PRODUCT_NOT_INCLUDED",
            DenialReason::TokenLimitExceeded { .. } => "TOKEN_LIMIT_EXCEEDED",
        }
    }
}

/// The assistant the user tried to reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantSnapshot {
    pub id: AssistantId,
    /// `None` when the assistant is not in the catalog.
    pub name: Option<String>,
    pub required_product: Option<ProductId>,
}

/// Subscription state at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    pub subscription_id: SubscriptionId,
    pub status: SubscriptionStatus,
    pub interval: BillingInterval,
    pub products: Vec<ProductId>,
    pub token_allowance: TokenAllowance,
}

impl From<&EntitlementGrant> for SubscriptionSnapshot {
    fn from(grant: &EntitlementGrant) -> Self {
        Self {
            subscription_id: grant.subscription_id.clone(),
            status: grant.status,
            interval: grant.interval,
            products: grant.products.clone(),
            token_allowance: grant.token_allowance,
        }
    }
}

/// Period-to-date consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub used: u64,
    /// `None` for unlimited allowances.
    pub allowance: Option<u64>,
    pub reset_date: NaiveDate,
}

impl UsageSnapshot {
    pub fn remaining(&self) -> Option<u64> {
        self.allowance.map(|a| a.saturating_sub(self.used))
    }
}

/// A negative authorization result.
///
/// Carries enough context for a client to render the remediation prompt
/// without another round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denial {
    #[serde(flatten)]
    pub reason: DenialReason,
    pub remediation: Remediation,
    pub assistant: AssistantSnapshot,
    pub subscription: Option<SubscriptionSnapshot>,
    pub usage: Option<UsageSnapshot>,
}

impl Denial {
    pub fn new(
        reason: DenialReason,
        assistant: AssistantSnapshot,
        subscription: Option<SubscriptionSnapshot>,
        usage: Option<UsageSnapshot>,
    ) -> Self {
        Self {
            remediation: reason.remediation(),
            reason,
            assistant,
            subscription,
            usage,
        }
    }

    /// User-facing explanation of the denial.
    pub fn user_message(&self) -> String {
        let name = self
            .assistant
            .name
            .clone()
            .unwrap_or_else(|| self.assistant.id.to_string());
        match &self.reason {
            DenialReason::NoSubscription { .. } => {
                format!("A subscription is required to chat with {}.", name)
            }
            DenialReason::ProductNotIncluded { .. } => {
                format!("Your plan does not include {}. Upgrade to continue.", name)
            }
            DenialReason::TokenLimitExceeded {
                used,
                allowance,
                reset_date,
            } => format!(
                "You've used {} of {} tokens this period. Purchase more tokens or wait until {}.",
                used, allowance, reset_date
            ),
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

/// A positive authorization result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub grant: EntitlementGrant,
    pub assistant: AssistantSnapshot,
    /// Present when the allowance is finite.
    pub usage: Option<UsageSnapshot>,
}

/// Outcome of evaluating a (user, assistant) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Granted(Grant),
    Denied(Denial),
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted(_))
    }

    pub fn into_result(self) -> Result<Grant, Denial> {
        match self {
            AccessDecision::Granted(grant) => Ok(grant),
            AccessDecision::Denied(denial) => Err(denial),
        }
    }
}

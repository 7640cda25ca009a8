//! Entitlement domain module.
//!
//! Read model of a user's subscription and the pure policy that turns it
//! into an access decision for a given assistant.

mod decision;
mod grant;
mod policy;

pub use decision::{
    AccessDecision, AssistantSnapshot, Denial, DenialReason, Grant, Remediation,
    SubscriptionSnapshot, UsageSnapshot,
};
pub use grant::{BillingInterval, EntitlementGrant, SubscriptionStatus, TokenAllowance};
pub use policy::AccessPolicy;

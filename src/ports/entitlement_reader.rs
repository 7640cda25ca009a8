//! EntitlementReader port - Read access to subscription state.
//!
//! Subscriptions, products and their token allowances are owned by the
//! billing subsystem. The chat core only queries them.

use async_trait::async_trait;

use crate::domain::entitlement::EntitlementGrant;
use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};

/// Port for reading a user's entitlement.
#[async_trait]
pub trait EntitlementReader: Send + Sync {
    /// The user's current subscription, if any.
    ///
    /// Implementations return the most relevant grant; callers still check
    /// `is_active_at` because status and end date can lag.
    async fn get_active_grant(&self, user_id: &UserId) -> Result<Option<EntitlementGrant>, DomainError>;

    /// Tokens consumed by the user under `subscription_id` since `since`.
    async fn period_usage(
        &self,
        user_id: &UserId,
        subscription_id: &SubscriptionId,
        since: Timestamp,
    ) -> Result<u64, DomainError>;
}

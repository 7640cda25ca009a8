//! In-memory entitlement read model.
//!
//! Grants are seeded directly; period usage is read from the shared
//! in-memory ledger so that recorded turns count against the allowance.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::InMemoryUsageLedger;
use crate::domain::entitlement::EntitlementGrant;
use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use crate::ports::{EntitlementReader, UsageLedger};

#[derive(Debug, Clone)]
pub struct InMemoryEntitlementStore {
    grants: Arc<RwLock<HashMap<UserId, EntitlementGrant>>>,
    ledger: InMemoryUsageLedger,
}

impl InMemoryEntitlementStore {
    pub fn new(ledger: InMemoryUsageLedger) -> Self {
        Self {
            grants: Arc::new(RwLock::new(HashMap::new())),
            ledger,
        }
    }

    /// Sets or replaces the user's grant.
    pub async fn put_grant(&self, grant: EntitlementGrant) {
        self.grants.write().await.insert(grant.user_id.clone(), grant);
    }

    pub async fn remove_grant(&self, user_id: &UserId) {
        self.grants.write().await.remove(user_id);
    }
}

#[async_trait]
impl EntitlementReader for InMemoryEntitlementStore {
    async fn get_active_grant(
        &self,
        user_id: &UserId,
    ) -> Result<Option<EntitlementGrant>, DomainError> {
        Ok(self.grants.read().await.get(user_id).cloned())
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

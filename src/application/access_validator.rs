//! AccessValidator - decides whether a user may talk to an assistant.
//!
//! Runs immediately before every billable action. Nothing is cached:
//! entitlement and usage can change between calls.

use std::sync::Arc;

use tracing::{debug, info};

use super::ChatError;
use crate::domain::catalog::AssistantCatalog;
use crate::domain::entitlement::{AccessDecision, AccessPolicy, Grant};
use crate::domain::foundation::{AssistantId, Timestamp, UserId};
use crate::ports::EntitlementReader;

pub struct AccessValidator {
    catalog: Arc<AssistantCatalog>,
    entitlements: Arc<dyn EntitlementReader>,
}

impl AccessValidator {
    pub fn new(catalog: Arc<AssistantCatalog>, entitlements: Arc<dyn EntitlementReader>) -> Self {
        Self {
            catalog,
            entitlements,
        }
    }

    pub fn catalog(&self) -> &AssistantCatalog {
        &self.catalog
    }

    /// Evaluates access for `(user_id, assistant_id)`.
    ///
    /// Period usage is only read when the grant has a finite allowance and
    /// the product check has passed.
    pub async fn evaluate(
        &self,
        user_id: &UserId,
        assistant_id: &AssistantId,
    ) -> Result<AccessDecision, ChatError> {
        let policy = AccessPolicy::new(&self.catalog, assistant_id, Timestamp::now());

        let grant = self.entitlements.get_active_grant(user_id).await?;
        let grant = match policy.check_entitlement(grant) {
            Ok(grant) => grant,
            Err(denial) => return Ok(AccessDecision::Denied(denial)),
        };

        let used = match grant.token_allowance.limit() {
            Some(_) => Some(
                self.entitlements
                    .period_usage(user_id, &grant.subscription_id, policy.period_start())
                    .await?,
            ),
            None => None,
        };

        Ok(policy.check_allowance(grant, used))
    }

    /// Like [`AccessValidator::evaluate`] but turns a denial into an error.
    pub async fn require(
        &self,
        user_id: &UserId,
        assistant_id: &AssistantId,
    ) -> Result<Grant, ChatError> {
        match self.evaluate(user_id, assistant_id).await? {
            AccessDecision::Granted(grant) => {
                debug!(
                    user_id = %user_id,
                    assistant_id = %assistant_id,
                    subscription_id = %grant.grant.subscription_id,
                    "access granted"
                );
                Ok(grant)
            }
            AccessDecision::Denied(denial) => {
                info!(
                    user_id = %user_id,
                    assistant_id = %assistant_id,
                    reason = denial.reason.code(),
                    "access denied"
                );
                Err(ChatError::denied(denial))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryEntitlementStore, InMemoryUsageLedger};
    use crate::domain::catalog::BUILTIN_CATALOG;
    use crate::domain::entitlement::{
        BillingInterval, DenialReason, EntitlementGrant, SubscriptionStatus, TokenAllowance,
    };
    use crate::domain::foundation::{DomainError, ProductId, SubscriptionId};
    use crate::domain::usage::{TokenKind, UsageLedgerEntry};
    use crate::ports::UsageLedger;
    use async_trait::async_trait;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn maintenance() -> AssistantId {
        AssistantId::new("asst_line_maintenance").unwrap()
    }

    fn grant(allowance: TokenAllowance) -> EntitlementGrant {
        EntitlementGrant {
            subscription_id: SubscriptionId::new("sub_1").unwrap(),
            user_id: user(),
            organization_id: None,
            status: SubscriptionStatus::Active,
            interval: BillingInterval::Monthly,
            products: vec![ProductId::new("prod_maintenance").unwrap()],
            token_allowance: allowance,
            ends_at: None,
        }
    }

    fn validator(store: InMemoryEntitlementStore) -> AccessValidator {
        AccessValidator::new(Arc::new(BUILTIN_CATALOG.clone()), Arc::new(store))
    }

    async fn record(ledger: &InMemoryUsageLedger, tokens: u64) {
        ledger
            .append(&[UsageLedgerEntry::new(
                user(),
                None,
                Some(SubscriptionId::new("sub_1").unwrap()),
                "gpt-4o",
                TokenKind::Input,
                tokens,
                Timestamp::now(),
            )])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn denies_without_subscription_then_grants_once_subscribed() {
        let ledger = InMemoryUsageLedger::new();
        let store = InMemoryEntitlementStore::new(ledger);
        let v = validator(store.clone());

        let decision = v.evaluate(&user(), &maintenance()).await.unwrap();
        match decision {
            AccessDecision::Denied(d) => assert_eq!(d.reason.code(), "NO_SUBSCRIPTION"),
            AccessDecision::Granted(_) => panic!("expected denial"),
        }

        store.put_grant(grant(TokenAllowance::Limited(1000))).await;
        assert!(v.evaluate(&user(), &maintenance()).await.unwrap().is_granted());
    }

    #[tokio::test]
    async fn denies_when_recorded_usage_reaches_allowance() {
        let ledger = InMemoryUsageLedger::new();
        let store = InMemoryEntitlementStore::new(ledger.clone());
        store.put_grant(grant(TokenAllowance::Limited(100))).await;
        let v = validator(store);

        record(&ledger, 99).await;
        assert!(v.require(&user(), &maintenance()).await.is_ok());

        record(&ledger, 1).await;
        let err = v.require(&user(), &maintenance()).await.unwrap_err();
        match err.denial().map(|d| &d.reason) {
            Some(DenialReason::TokenLimitExceeded { used, allowance, .. }) => {
                assert_eq!(*used, 100);
                assert_eq!(*allowance, 100);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    struct CountingReader {
        grant: EntitlementGrant,
        usage_reads: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl EntitlementReader for CountingReader {
        async fn get_active_grant(&self, _: &UserId) -> Result<Option<EntitlementGrant>, DomainError> {
            Ok(Some(self.grant.clone()))
        }

        async fn period_usage(&self, _: &UserId, _: &SubscriptionId, _: Timestamp) -> Result<u64, DomainError> {
            self.usage_reads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(0)
        }
    }

    #[tokio::test]
    async fn usage_is_not_read_for_unlimited_or_wrong_product() {
        let reader = Arc::new(CountingReader {
            grant: grant(TokenAllowance::Unlimited),
            usage_reads: Default::default(),
        });
        let v = AccessValidator::new(Arc::new(BUILTIN_CATALOG.clone()), reader.clone());

        assert!(v.evaluate(&user(), &maintenance()).await.unwrap().is_granted());
        let avionics = AssistantId::new("asst_avionics").unwrap();
        assert!(!v.evaluate(&user(), &avionics).await.unwrap().is_granted());
        assert_eq!(reader.usage_reads.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    struct FailingReader;

    #[async_trait]
    impl EntitlementReader for FailingReader {
        async fn get_active_grant(&self, _: &UserId) -> Result<Option<EntitlementGrant>, DomainError> {
            Err(DomainError::database("connection refused"))
        }

        async fn period_usage(&self, _: &UserId, _: &SubscriptionId, _: Timestamp) -> Result<u64, DomainError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn reader_failure_is_storage_error() {
        let v = AccessValidator::new(Arc::new(BUILTIN_CATALOG.clone()), Arc::new(FailingReader));
        let err = v.evaluate(&user(), &maintenance()).await.unwrap_err();
        assert!(matches!(err, ChatError::Storage(_)));
    }
}

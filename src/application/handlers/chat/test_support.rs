//! Shared wiring for handler tests.

use std::sync::Arc;

use crate::adapters::ai::{ScriptedAssistantProvider, MOCK_MODEL};
use crate::adapters::memory::{InMemoryChatStore, InMemoryEntitlementStore, InMemoryUsageLedger};
use crate::application::{
    AccessValidator, MessageClassifier, Settlement, StreamOrchestrator, TaskSupervisor, UsageMeter,
};
use crate::domain::catalog::BUILTIN_CATALOG;
use crate::domain::chat::Thread;
use crate::domain::entitlement::{
    BillingInterval, EntitlementGrant, SubscriptionStatus, TokenAllowance,
};
use crate::domain::foundation::{
    AssistantId, OrganizationId, ProductId, SubscriptionId, Timestamp, UserId,
};
use crate::domain::usage::{TokenKind, UsageLedgerEntry, DEFAULT_PRICING};
use crate::ports::{
    AssistantProvider, EntitlementReader, MessageRepository, ThreadRepository, UsageLedger,
};

pub(crate) struct Harness {
    pub store: InMemoryChatStore,
    pub provider: ScriptedAssistantProvider,
    pub ledger: InMemoryUsageLedger,
    pub entitlements: InMemoryEntitlementStore,
    pub supervisor: TaskSupervisor,
}

impl Harness {
    fn bare() -> Self {
        let ledger = InMemoryUsageLedger::new();
        Self {
            store: InMemoryChatStore::new(),
            provider: ScriptedAssistantProvider::new(),
            entitlements: InMemoryEntitlementStore::new(ledger.clone()),
            ledger,
            supervisor: TaskSupervisor::new(),
        }
    }

    pub async fn unsubscribed() -> Self {
        Self::bare()
    }

    pub async fn subscribed() -> Self {
        Self::subscribed_with_allowance(1_000_000).await
    }

    pub async fn subscribed_with_allowance(tokens: u64) -> Self {
        let h = Self::bare();
        h.entitlements
            .put_grant(EntitlementGrant {
                subscription_id: SubscriptionId::new("sub_1").unwrap(),
                user_id: h.user(),
                organization_id: Some(OrganizationId::new("org_1").unwrap()),
                status: SubscriptionStatus::Active,
                interval: BillingInterval::Monthly,
                products: vec![ProductId::new("prod_maintenance").unwrap()],
                token_allowance: TokenAllowance::Limited(tokens),
                ends_at: None,
            })
            .await;
        h
    }

    pub fn user(&self) -> UserId {
        UserId::new("user-1").unwrap()
    }

    pub fn assistant(&self) -> AssistantId {
        AssistantId::new("asst_line_maintenance").unwrap()
    }

    pub fn threads(&self) -> Arc<dyn ThreadRepository> {
        Arc::new(self.store.clone())
    }

    pub fn messages(&self) -> Arc<dyn MessageRepository> {
        Arc::new(self.store.clone())
    }

    pub fn provider(&self) -> Arc<dyn AssistantProvider> {
        Arc::new(self.provider.clone())
    }

    pub fn ledger_port(&self) -> Arc<dyn UsageLedger> {
        Arc::new(self.ledger.clone())
    }

    pub fn entitlement_port(&self) -> Arc<dyn EntitlementReader> {
        Arc::new(self.entitlements.clone())
    }

    pub fn validator(&self) -> Arc<AccessValidator> {
        Arc::new(AccessValidator::new(
            Arc::new(BUILTIN_CATALOG.clone()),
            self.entitlement_port(),
        ))
    }

    pub fn meter(&self) -> Arc<UsageMeter> {
        Arc::new(UsageMeter::new(
            self.ledger_port(),
            Arc::new(DEFAULT_PRICING.clone()),
        ))
    }

    pub fn orchestrator(&self) -> Arc<StreamOrchestrator> {
        let classifier = Arc::new(MessageClassifier::new(self.provider(), MOCK_MODEL));
        let settlement = Arc::new(Settlement::new(
            self.threads(),
            self.messages(),
            classifier,
            self.meter(),
        ));
        Arc::new(StreamOrchestrator::new(
            self.threads(),
            self.validator(),
            self.provider(),
            settlement,
            self.supervisor.clone(),
            16,
        ))
    }

    /// Saves a thread backed by a fresh provider conversation.
    pub async fn thread(&self) -> Thread {
        let handle = self.provider.create_conversation().await.unwrap();
        let thread = Thread::new(self.user(), self.assistant(), handle);
        self.store.save(&thread).await.unwrap();
        thread
    }

    /// Charges `tokens` input tokens against the current period.
    pub async fn consume(&self, tokens: u64) {
        let entry = UsageLedgerEntry::new(
            self.user(),
            Some(OrganizationId::new("org_1").unwrap()),
            Some(SubscriptionId::new("sub_1").unwrap()),
            "gpt-4o",
            TokenKind::Input,
            tokens,
            Timestamp::now(),
        );
        self.ledger.append(&[entry]).await.unwrap();
    }
}

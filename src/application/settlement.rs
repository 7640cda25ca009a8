//! Post-stream settlement.
//!
//! Runs once per run that ended normally. Each step is independent: a
//! failing step is logged and recorded in the report, and the remaining
//! steps still run. Nothing is retried and nothing is surfaced to the
//! stream consumer.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use super::{MessageClassifier, UsageAttribution, UsageMeter};
use crate::domain::chat::{Category, Message, Thread};
use crate::domain::entitlement::Grant;
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::stream::TokenUsage;
use crate::ports::{MessageRepository, ThreadRepository};

/// Settlement step identifiers, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStep {
    PersistMessage,
    BackfillCategory,
    RecordUsage,
    TouchThread,
}

impl SettlementStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStep::PersistMessage => "persist_message",
            SettlementStep::BackfillCategory => "backfill_category",
            SettlementStep::RecordUsage => "record_usage",
            SettlementStep::TouchThread => "touch_thread",
        }
    }
}

/// A step that failed.
#[derive(Debug, Clone)]
pub struct SettlementFailure {
    pub step: SettlementStep,
    pub error: DomainError,
}

/// Everything settlement needs, captured when the stream was opened.
#[derive(Debug, Clone)]
pub struct SettlementInput {
    pub thread: Thread,
    pub user_id: UserId,
    pub grant: Grant,
    pub text: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// What settlement managed to do.
#[derive(Debug, Clone, Default)]
pub struct SettlementReport {
    pub category: Option<Category>,
    pub message_saved: bool,
    pub question_backfilled: bool,
    pub usage_recorded: bool,
    pub failures: Vec<SettlementFailure>,
}

impl SettlementReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, step: SettlementStep, input: &SettlementInput, error: DomainError) {
        error!(
            step = step.as_str(),
            thread_id = %input.thread.id(),
            user_id = %input.user_id,
            error = %error,
            "settlement step failed"
        );
        self.failures.push(SettlementFailure { step, error });
    }
}

impl fmt::Display for SettlementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<&str> = self.failures.iter().map(|fl| fl.step.as_str()).collect();
        write!(f, "settlement incomplete: failed steps [{}]", steps.join(", "))
    }
}

pub struct Settlement {
    threads: Arc<dyn ThreadRepository>,
    messages: Arc<dyn MessageRepository>,
    classifier: Arc<MessageClassifier>,
    meter: Arc<UsageMeter>,
}

impl Settlement {
    pub fn new(
        threads: Arc<dyn ThreadRepository>,
        messages: Arc<dyn MessageRepository>,
        classifier: Arc<MessageClassifier>,
        meter: Arc<UsageMeter>,
    ) -> Self {
        Self {
            threads,
            messages,
            classifier,
            meter,
        }
    }

    pub async fn settle(&self, input: SettlementInput) -> SettlementReport {
        let mut report = SettlementReport::default();
        let thread_id = input.thread.id();

        if !input.text.trim().is_empty() {
            let category = self.classifier.classify(&input.text).await;
            report.category = Some(category);

            let saved = match Message::assistant(thread_id, input.text.clone()) {
                Ok(message) => self.messages.append(&message.with_category(category)).await,
                Err(e) => Err(e),
            };
            match saved {
                Ok(()) => report.message_saved = true,
                Err(e) => report.fail(SettlementStep::PersistMessage, &input, e),
            }

            match self.backfill_question(&input, category).await {
                Ok(done) => report.question_backfilled = done,
                Err(e) => report.fail(SettlementStep::BackfillCategory, &input, e),
            }
        }

        if let Some(usage) = input.usage {
            let attribution = UsageAttribution {
                user_id: input.user_id.clone(),
                organization_id: input.grant.grant.organization_id.clone(),
                subscription_id: Some(input.grant.grant.subscription_id.clone()),
            };
            match self
                .meter
                .record(&attribution, &input.model, usage.prompt_tokens, usage.completion_tokens)
                .await
            {
                Ok(_) => report.usage_recorded = true,
                Err(e) => report.fail(SettlementStep::RecordUsage, &input, e),
            }
        }

        if let Err(e) = self.threads.touch(&thread_id, Timestamp::now()).await {
            report.fail(SettlementStep::TouchThread, &input, e);
        }

        debug!(
            thread_id = %thread_id,
            user_id = %input.user_id,
            message_saved = report.message_saved,
            usage_recorded = report.usage_recorded,
            "settlement finished"
        );
        report
    }

    async fn backfill_question(
        &self,
        input: &SettlementInput,
        category: Category,
    ) -> Result<bool, DomainError> {
        match self
            .messages
            .latest_uncategorized_user_message(&input.thread.id())
            .await?
        {
            Some(question) => self.messages.set_category_if_absent(&question.id(), category).await,
            None => Ok(false),
        }
    }
}

//! Pure access policy.
//!
//! The checks run in a fixed order and stop at the first failure:
//! subscription, product, allowance. Fetching period usage is the caller's
//! job and only happens once [`AccessPolicy::check_entitlement`] has passed.

use super::decision::{
    AccessDecision, AssistantSnapshot, Denial, DenialReason, Grant, SubscriptionSnapshot,
    UsageSnapshot,
};
use super::grant::EntitlementGrant;
use crate::domain::catalog::AssistantCatalog;
use crate::domain::foundation::{AssistantId, Timestamp};

/// Evaluates entitlement for one assistant at a fixed instant.
#[derive(Debug)]
pub struct AccessPolicy<'a> {
    catalog: &'a AssistantCatalog,
    assistant: AssistantSnapshot,
    now: Timestamp,
}

impl<'a> AccessPolicy<'a> {
    pub fn new(catalog: &'a AssistantCatalog, assistant_id: &AssistantId, now: Timestamp) -> Self {
        let assistant = match catalog.get(assistant_id) {
            Some(descriptor) => AssistantSnapshot {
                id: descriptor.id.clone(),
                name: Some(descriptor.label.clone()),
                required_product: Some(descriptor.required_product.clone()),
            },
            None => AssistantSnapshot {
                id: assistant_id.clone(),
                name: None,
                required_product: None,
            },
        };
        Self {
            catalog,
            assistant,
            now,
        }
    }

    pub fn assistant(&self) -> &AssistantSnapshot {
        &self.assistant
    }

    /// Lower bound of the current usage period.
    pub fn period_start(&self) -> Timestamp {
        self.now.start_of_month()
    }

    /// Checks subscription presence and product inclusion.
    ///
    /// An unknown assistant has no required product, so only the
    /// subscription check applies.
    pub fn check_entitlement(
        &self,
        grant: Option<EntitlementGrant>,
    ) -> Result<EntitlementGrant, Denial> {
        let grant = match grant.filter(|g| g.is_active_at(&self.now)) {
            Some(grant) => grant,
            None => {
                let suggested_products = match &self.assistant.required_product {
                    Some(product) => vec![product.clone()],
                    None => self.catalog.products(),
                };
                return Err(Denial::new(
                    DenialReason::NoSubscription { suggested_products },
                    self.assistant.clone(),
                    None,
                    None,
                ));
            }
        };

        if let Some(required) = &self.assistant.required_product {
            if !grant.includes(required) {
                return Err(Denial::new(
                    DenialReason::ProductNotIncluded {
                        current_products: grant.products.clone(),
                    },
                    self.assistant.clone(),
                    Some(SubscriptionSnapshot::from(&grant)),
                    None,
                ));
            }
        }

        Ok(grant)
    }

    /// Compares period usage against the allowance.
    ///
    /// `used` must be `Some` for finite allowances; it is ignored for
    /// unlimited ones.
    pub fn check_allowance(&self, grant: EntitlementGrant, used: Option<u64>) -> AccessDecision {
        let reset_date = self.now.start_of_next_month().date();

        let limit = match grant.token_allowance.limit() {
            Some(limit) => limit,
            None => {
                return AccessDecision::Granted(Grant {
                    grant,
                    assistant: self.assistant.clone(),
                    usage: None,
                })
            }
        };

        let used = used.unwrap_or(0);
        let usage = UsageSnapshot {
            used,
            allowance: Some(limit),
            reset_date,
        };

        if used >= limit {
            return AccessDecision::Denied(Denial::new(
                DenialReason::TokenLimitExceeded {
                    used,
                    allowance: limit,
                    reset_date,
                },
                self.assistant.clone(),
                Some(SubscriptionSnapshot::from(&grant)),
                Some(usage),
            ));
        }

        AccessDecision::Granted(Grant {
            grant,
            assistant: self.assistant.clone(),
            usage: Some(usage),
        })
    }
}

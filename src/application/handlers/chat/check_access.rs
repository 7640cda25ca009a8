//! CheckAccessHandler - Query handler exposing the access decision.
//!
//! Lets a client render the remediation prompt before the user types.
//! No side effects.

use std::sync::Arc;

use crate::application::{AccessValidator, ChatError};
use crate::domain::entitlement::AccessDecision;
use crate::domain::foundation::{AssistantId, UserId};

#[derive(Debug, Clone)]
pub struct CheckAccessQuery {
    pub user_id: UserId,
    pub assistant_id: AssistantId,
}

pub struct CheckAccessHandler {
    validator: Arc<AccessValidator>,
}

impl CheckAccessHandler {
    pub fn new(validator: Arc<AccessValidator>) -> Self {
        Self { validator }
    }

    pub async fn handle(&self, query: CheckAccessQuery) -> Result<AccessDecision, ChatError> {
        self.validator
            .evaluate(&query.user_id, &query.assistant_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::chat::test_support::Harness;

    #[tokio::test]
    async fn reports_grant_for_subscribed_user() {
        let h = Harness::subscribed().await;
        let decision = CheckAccessHandler::new(h.validator())
            .handle(CheckAccessQuery { user_id: h.user(), assistant_id: h.assistant() })
            .await
            .unwrap();
        assert!(decision.is_granted());
    }

    #[tokio::test]
    async fn reports_upgrade_for_missing_product() {
        let h = Harness::subscribed().await;
        let decision = CheckAccessHandler::new(h.validator())
            .handle(CheckAccessQuery {
                user_id: h.user(),
                assistant_id: AssistantId::new("asst_regulatory").unwrap(),
            })
            .await
            .unwrap();
        match decision {
            AccessDecision::Denied(denial) => assert_eq!(denial.reason.code(), "PRODUCT_NOT_INCLUDED"),
            AccessDecision::Granted(_) => panic!("expected denial"),
        }
    }
}

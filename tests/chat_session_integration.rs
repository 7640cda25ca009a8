//! Integration tests for a complete chat session.
//!
//! These tests wire the real application services over in-memory stores and
//! the scripted provider, the same way the binary wires them over Postgres
//! and OpenAI:
//! 1. Subscribed users can open a thread, ask, stream the answer and see it
//!    persisted, classified and metered
//! 2. Denials carry the structured reason
//! 3. The HTTP surface renders the same behavior

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use assistant_hub::adapters::ai::{MockCompletion, ScriptedAssistantProvider, ScriptedRun};
use assistant_hub::adapters::http::ChatHandlers;
use assistant_hub::adapters::memory::InMemoryEntitlementStore;
use assistant_hub::app::{build_handlers, build_router, ChatPorts, ChatSettings};
use assistant_hub::application::handlers::chat::{
    CheckAccessQuery, CreateThreadCommand, DeleteThreadCommand, GetUsageQuery, ListMessagesQuery,
    ListThreadsQuery, OpenAssistantStreamCommand, PostUserTurnCommand,
};
use assistant_hub::application::{ChatError, TaskSupervisor};
use assistant_hub::config::ServerConfig;
use assistant_hub::domain::catalog::BUILTIN_CATALOG;
use assistant_hub::domain::chat::{Category, MessageRole, Thread};
use assistant_hub::domain::entitlement::{
    AccessDecision, BillingInterval, DenialReason, EntitlementGrant, SubscriptionStatus,
    TokenAllowance,
};
use assistant_hub::domain::foundation::{
    AssistantId, OrganizationId, ProductId, SubscriptionId, UserId,
};
use assistant_hub::domain::stream::{StreamEvent, TokenUsage};
use assistant_hub::domain::usage::DEFAULT_PRICING;

// =============================================================================
// Test Infrastructure
// =============================================================================

const ANSWER: &str = "Pack failure means loss of cabin pressurization control.";

struct Session {
    handlers: ChatHandlers,
    provider: ScriptedAssistantProvider,
    entitlements: InMemoryEntitlementStore,
    supervisor: TaskSupervisor,
}

impl Session {
    fn new() -> Self {
        let provider = ScriptedAssistantProvider::new();
        let (ports, entitlements) = ChatPorts::in_memory(Arc::new(provider.clone()));
        let supervisor = TaskSupervisor::new();
        let handlers = build_handlers(
            &ports,
            ChatSettings {
                catalog: BUILTIN_CATALOG.clone(),
                pricing: DEFAULT_PRICING.clone(),
                classifier_model: "gpt-4o-mini".to_string(),
                naming_model: "gpt-4o-mini".to_string(),
                stream_buffer: 8,
            },
            supervisor.clone(),
        );
        Self {
            handlers,
            provider,
            entitlements,
            supervisor,
        }
    }

    async fn subscribed(allowance: u64) -> Self {
        let session = Self::new();
        session.grant(&["prod_maintenance"], allowance).await;
        session
    }

    async fn grant(&self, products: &[&str], allowance: u64) {
        self.entitlements
            .put_grant(EntitlementGrant {
                subscription_id: SubscriptionId::new("sub_it").unwrap(),
                user_id: user(),
                organization_id: Some(OrganizationId::new("org_it").unwrap()),
                status: SubscriptionStatus::Active,
                interval: BillingInterval::Monthly,
                products: products.iter().map(|p| ProductId::new(*p).unwrap()).collect(),
                token_allowance: TokenAllowance::Limited(allowance),
                ends_at: None,
            })
            .await;
    }

    async fn open_thread(&self) -> Thread {
        self.handlers
            .create_thread
            .handle(CreateThreadCommand {
                user_id: user(),
                assistant_id: maintenance(),
            })
            .await
            .unwrap()
    }

    async fn ask(&self, thread: &Thread, question: &str) -> Result<(), ChatError> {
        self.handlers
            .post_user_turn
            .handle(PostUserTurnCommand {
                handle: thread.provider_handle().clone(),
                user_id: user(),
                content: question.to_string(),
            })
            .await
            .map(|_| ())
    }

    async fn stream(&self, thread: &Thread) -> Result<Vec<StreamEvent>, ChatError> {
        let stream = self
            .handlers
            .open_stream
            .handle(OpenAssistantStreamCommand {
                handle: thread.provider_handle().clone(),
                user_id: user(),
            })
            .await?;
        let events = stream.collect().await;
        self.supervisor.wait_idle().await;
        Ok(events)
    }

    fn router(&self) -> axum::Router {
        build_router(self.handlers.clone(), &ServerConfig::default())
    }
}

fn user() -> UserId {
    UserId::new("user-it").unwrap()
}

fn maintenance() -> AssistantId {
    AssistantId::new("asst_line_maintenance").unwrap()
}

fn usage(prompt: u64, completion: u64) -> Option<TokenUsage> {
    Some(TokenUsage {
        prompt_tokens: prompt,
        completion_tokens: completion,
    })
}

fn accumulated(events: &[StreamEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::TextDelta { value } => Some(value.as_str()),
            _ => None,
        })
        .collect()
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", "user-it");
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Session flow
// =============================================================================

#[tokio::test]
async fn full_session_streams_persists_classifies_and_meters() {
    let session = Session::subscribed(1_000_000).await;
    session
        .provider
        .push_run(ScriptedRun::text(ANSWER, usage(120, 12)));
    session.provider.push_completion(MockCompletion::Success {
        content: "Environmental".to_string(),
        usage: None,
    });

    let thread = session.open_thread().await;
    session
        .ask(&thread, "What does a PACK 1 FAULT caution indicate?")
        .await
        .unwrap();
    let events = session.stream(&thread).await.unwrap();

    assert_eq!(events.first(), Some(&StreamEvent::TextCreated));
    assert!(events.last().unwrap().is_terminal());
    assert_eq!(accumulated(&events), ANSWER);

    let messages = session
        .handlers
        .list_messages
        .handle(ListMessagesQuery {
            thread_id: thread.id(),
            user_id: user(),
        })
        .await
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role(), MessageRole::User);
    assert_eq!(messages[1].role(), MessageRole::Assistant);
    assert_eq!(messages[1].body(), ANSWER);
    assert_eq!(messages[0].category(), Some(Category::Environmental));
    assert_eq!(messages[1].category(), Some(Category::Environmental));

    let report = session
        .handlers
        .get_usage
        .handle(GetUsageQuery { user_id: user() })
        .await
        .unwrap();
    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.totals.input_tokens, 120);
    assert_eq!(report.totals.output_tokens, 12);
    assert_eq!(report.allowance, Some(1_000_000));
    assert_eq!(session.supervisor.failures(), 0);
}

#[tokio::test]
async fn failed_run_is_not_persisted_or_metered() {
    let session = Session::subscribed(1_000_000).await;
    session.provider.push_run(ScriptedRun::events(vec![
        StreamEvent::TextCreated,
        StreamEvent::TextDelta {
            value: "Partial".to_string(),
        },
        StreamEvent::error("server_error", "run failed"),
    ]));

    let thread = session.open_thread().await;
    session.ask(&thread, "Why is the pack tripping?").await.unwrap();
    let events = session.stream(&thread).await.unwrap();

    assert!(matches!(events.last(), Some(StreamEvent::Error { .. })));
    let messages = session
        .handlers
        .list_messages
        .handle(ListMessagesQuery {
            thread_id: thread.id(),
            user_id: user(),
        })
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].category(), None);

    let report = session
        .handlers
        .get_usage
        .handle(GetUsageQuery { user_id: user() })
        .await
        .unwrap();
    assert!(report.entries.is_empty());
}

#[tokio::test]
async fn deleted_thread_disappears_from_listings() {
    let session = Session::subscribed(1_000_000).await;
    let kept = session.open_thread().await;
    let dropped = session.open_thread().await;
    session.ask(&dropped, "Hydraulic reservoir check?").await.unwrap();

    session
        .handlers
        .delete_thread
        .handle(DeleteThreadCommand {
            thread_id: dropped.id(),
            user_id: user(),
        })
        .await
        .unwrap();

    let threads = session
        .handlers
        .list_threads
        .handle(ListThreadsQuery { user_id: user() })
        .await
        .unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].id(), kept.id());

    let messages = session
        .handlers
        .list_messages
        .handle(ListMessagesQuery {
            thread_id: dropped.id(),
            user_id: user(),
        })
        .await
        .unwrap();
    assert!(messages.is_empty());

    let result = session.stream(&dropped).await;
    assert!(matches!(result, Err(ChatError::NotFound { .. })));
}

// =============================================================================
// Access control
// =============================================================================

#[tokio::test]
async fn unsubscribed_user_is_told_to_subscribe() {
    let session = Session::new();

    let result = session
        .handlers
        .create_thread
        .handle(CreateThreadCommand {
            user_id: user(),
            assistant_id: maintenance(),
        })
        .await;

    match result {
        Err(ChatError::AccessDenied(denial)) => {
            assert!(matches!(denial.reason, DenialReason::NoSubscription { .. }));
        }
        other => panic!("expected a denial, got {:?}", other.map(|t| t.id())),
    }
    assert_eq!(session.provider.conversation_count(), 0);
}

#[tokio::test]
async fn other_product_is_an_upgrade_denial() {
    let session = Session::new();
    session.grant(&["prod_avionics"], 1_000_000).await;

    let decision = session
        .handlers
        .check_access
        .handle(CheckAccessQuery {
            user_id: user(),
            assistant_id: maintenance(),
        })
        .await
        .unwrap();

    match decision {
        AccessDecision::Denied(denial) => match denial.reason {
            DenialReason::ProductNotIncluded { current_products } => {
                assert_eq!(current_products[0].as_str(), "prod_avionics");
            }
            other => panic!("unexpected reason {:?}", other),
        },
        AccessDecision::Granted(_) => panic!("expected a denial"),
    }
}

#[tokio::test]
async fn allowance_is_enforced_once_consumed() {
    let session = Session::subscribed(100).await;
    session
        .provider
        .push_run(ScriptedRun::text(ANSWER, usage(70, 30)));

    let thread = session.open_thread().await;
    session.ask(&thread, "First question").await.unwrap();
    session.stream(&thread).await.unwrap();

    let result = session.ask(&thread, "Second question").await;
    match result {
        Err(ChatError::AccessDenied(denial)) => match denial.reason {
            DenialReason::TokenLimitExceeded {
                used, allowance, ..
            } => {
                assert_eq!(used, 100);
                assert_eq!(allowance, 100);
            }
            other => panic!("unexpected reason {:?}", other),
        },
        other => panic!("expected a denial, got {:?}", other),
    }
}

// =============================================================================
// HTTP surface
// =============================================================================

#[tokio::test]
async fn health_is_public() {
    let session = Session::new();
    let response = session
        .router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let session = Session::new();
    let response = session
        .router()
        .oneshot(Request::builder().uri("/api/threads").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn denial_renders_as_forbidden_with_reason() {
    let session = Session::new();
    let response = session
        .router()
        .oneshot(request(
            "POST",
            "/api/threads",
            Some(json!({ "assistant_id": "asst_line_maintenance" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["code"], "NO_SUBSCRIPTION");
    assert_eq!(body["details"]["reason"], "NO_SUBSCRIPTION");
}

#[tokio::test]
async fn session_over_http_streams_server_sent_events() {
    let session = Session::subscribed(1_000_000).await;
    session
        .provider
        .push_run(ScriptedRun::text(ANSWER, usage(40, 10)));
    let app = session.router();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/threads",
            Some(json!({ "assistant_id": "asst_line_maintenance" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let thread = json_body(response).await;
    let handle = thread["handle"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/conversations/{}/turns", handle),
            Some(json!({ "content": "What does a PACK 1 FAULT caution indicate?" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/conversations/{}/stream", handle),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.contains("event: text_created"));
    assert!(body.contains("event: text_delta"));
    assert!(body.contains("event: end"));

    session.supervisor.wait_idle().await;

    let response = app
        .oneshot(request("GET", "/api/usage", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = json_body(response).await;
    assert_eq!(report["totals"]["input_tokens"], 40);
    assert_eq!(report["totals"]["output_tokens"], 10);
}

//! Composition root shared by the binary and the integration tests.
//!
//! Wires port implementations into the application services and the
//! services into the HTTP layer. Nothing here carries business rules.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use http::{HeaderName, HeaderValue};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::adapters::http::{chat_routes, ChatHandlers};
use crate::adapters::memory::{InMemoryChatStore, InMemoryEntitlementStore, InMemoryUsageLedger};
use crate::adapters::postgres::{
    PostgresEntitlementReader, PostgresMessageRepository, PostgresThreadRepository,
    PostgresUsageLedger,
};
use crate::application::handlers::chat::{
    CheckAccessHandler, CreateThreadHandler, DeleteThreadHandler, GenerateThreadNameHandler,
    GetUsageHandler, ListAssistantsHandler, ListMessagesHandler, ListThreadsHandler,
    OpenAssistantStreamHandler, PostUserTurnHandler, RenameThreadHandler,
};
use crate::application::{
    AccessValidator, MessageClassifier, Settlement, StreamOrchestrator, TaskSupervisor, UsageMeter,
};
use crate::config::{CorsPolicy, ServerConfig};
use crate::domain::catalog::AssistantCatalog;
use crate::domain::usage::PricingTable;
use crate::ports::{
    AssistantProvider, EntitlementReader, MessageRepository, ThreadRepository, UsageLedger,
};

/// Every port the chat services depend on.
#[derive(Clone)]
pub struct ChatPorts {
    pub threads: Arc<dyn ThreadRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub ledger: Arc<dyn UsageLedger>,
    pub entitlements: Arc<dyn EntitlementReader>,
    pub provider: Arc<dyn AssistantProvider>,
}

impl ChatPorts {
    pub fn postgres(pool: PgPool, provider: Arc<dyn AssistantProvider>) -> Self {
        let ledger = PostgresUsageLedger::new(pool.clone());
        Self {
            threads: Arc::new(PostgresThreadRepository::new(pool.clone())),
            messages: Arc::new(PostgresMessageRepository::new(pool.clone())),
            entitlements: Arc::new(PostgresEntitlementReader::new(pool)),
            ledger: Arc::new(ledger),
            provider,
        }
    }

    /// In-memory stores. Returns the entitlement store so callers can seed
    /// grants.
    pub fn in_memory(provider: Arc<dyn AssistantProvider>) -> (Self, InMemoryEntitlementStore) {
        let store = InMemoryChatStore::new();
        let ledger = InMemoryUsageLedger::new();
        let entitlements = InMemoryEntitlementStore::new(ledger.clone());
        let ports = Self {
            threads: Arc::new(store.clone()),
            messages: Arc::new(store),
            ledger: Arc::new(ledger),
            entitlements: Arc::new(entitlements.clone()),
            provider,
        };
        (ports, entitlements)
    }
}

/// Static inputs to the chat services.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub catalog: AssistantCatalog,
    pub pricing: PricingTable,
    pub classifier_model: String,
    pub naming_model: String,
    pub stream_buffer: usize,
}

/// Builds every chat handler over one set of ports.
///
/// Settlement tasks are spawned on `supervisor`; drain it on shutdown.
pub fn build_handlers(
    ports: &ChatPorts,
    settings: ChatSettings,
    supervisor: TaskSupervisor,
) -> ChatHandlers {
    let catalog = Arc::new(settings.catalog);
    let validator = Arc::new(AccessValidator::new(
        catalog.clone(),
        ports.entitlements.clone(),
    ));
    let meter = Arc::new(UsageMeter::new(
        ports.ledger.clone(),
        Arc::new(settings.pricing),
    ));
    let classifier = Arc::new(MessageClassifier::new(
        ports.provider.clone(),
        settings.classifier_model,
    ));
    let settlement = Arc::new(Settlement::new(
        ports.threads.clone(),
        ports.messages.clone(),
        classifier,
        meter.clone(),
    ));
    let orchestrator = Arc::new(StreamOrchestrator::new(
        ports.threads.clone(),
        validator.clone(),
        ports.provider.clone(),
        settlement,
        supervisor,
        settings.stream_buffer,
    ));

    ChatHandlers {
        list_assistants: Arc::new(ListAssistantsHandler::new(catalog)),
        check_access: Arc::new(CheckAccessHandler::new(validator.clone())),
        create_thread: Arc::new(CreateThreadHandler::new(
            ports.threads.clone(),
            validator.clone(),
            ports.provider.clone(),
        )),
        list_threads: Arc::new(ListThreadsHandler::new(ports.threads.clone())),
        rename_thread: Arc::new(RenameThreadHandler::new(ports.threads.clone())),
        delete_thread: Arc::new(DeleteThreadHandler::new(
            ports.threads.clone(),
            ports.messages.clone(),
        )),
        list_messages: Arc::new(ListMessagesHandler::new(
            ports.threads.clone(),
            ports.messages.clone(),
        )),
        post_user_turn: Arc::new(PostUserTurnHandler::new(
            ports.threads.clone(),
            ports.messages.clone(),
            validator.clone(),
            ports.provider.clone(),
        )),
        open_stream: Arc::new(OpenAssistantStreamHandler::new(orchestrator)),
        generate_name: Arc::new(GenerateThreadNameHandler::new(
            ports.threads.clone(),
            validator,
            ports.provider.clone(),
            meter.clone(),
            settings.naming_model,
        )),
        get_usage: Arc::new(GetUsageHandler::new(
            ports.ledger.clone(),
            ports.entitlements.clone(),
            meter,
        )),
    }
}

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Full router: `/health` plus the chat API under `/api`.
pub fn build_router(handlers: ChatHandlers, server: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    Router::new()
        .route("/health", get(health))
        .nest("/api", chat_routes(handlers))
        // Bounds time to response head; streamed bodies are not cut off.
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(cors_layer(server))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    match server.cors_policy() {
        CorsPolicy::AllowAny => CorsLayer::permissive(),
        CorsPolicy::Closed => CorsLayer::new(),
        CorsPolicy::Origins(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

//! HTTP handlers for chat endpoints.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::{Stream, StreamExt};
use tracing::{error, warn};

use crate::adapters::http::middleware::RequireUser;
use crate::application::handlers::chat::{
    CheckAccessHandler, CheckAccessQuery, CreateThreadCommand, CreateThreadHandler,
    DeleteThreadCommand, DeleteThreadHandler, GenerateThreadNameCommand,
    GenerateThreadNameHandler, GetUsageHandler, GetUsageQuery, ListAssistantsHandler,
    ListMessagesHandler, ListMessagesQuery, ListThreadsHandler, ListThreadsQuery,
    OpenAssistantStreamCommand, OpenAssistantStreamHandler, PostUserTurnCommand,
    PostUserTurnHandler, RenameThreadCommand, RenameThreadHandler,
};
use crate::application::ChatError;
use crate::domain::foundation::{AssistantId, ProviderThreadHandle, ThreadId};
use crate::domain::stream::StreamEvent;
use crate::ports::AIError;

use super::dto::{
    CreateThreadRequest, ErrorResponse, MessageResponse, PostTurnRequest, RenameThreadRequest,
    ThreadNameResponse, ThreadResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ChatHandlers {
    pub list_assistants: Arc<ListAssistantsHandler>,
    pub check_access: Arc<CheckAccessHandler>,
    pub create_thread: Arc<CreateThreadHandler>,
    pub list_threads: Arc<ListThreadsHandler>,
    pub rename_thread: Arc<RenameThreadHandler>,
    pub delete_thread: Arc<DeleteThreadHandler>,
    pub list_messages: Arc<ListMessagesHandler>,
    pub post_user_turn: Arc<PostUserTurnHandler>,
    pub open_stream: Arc<OpenAssistantStreamHandler>,
    pub generate_name: Arc<GenerateThreadNameHandler>,
    pub get_usage: Arc<GetUsageHandler>,
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/assistants - The assistant catalog
pub async fn list_assistants(State(handlers): State<ChatHandlers>) -> Response {
    Json(handlers.list_assistants.handle()).into_response()
}

/// GET /api/assistants/:assistant_id/access - Pre-flight access decision
pub async fn check_access(
    State(handlers): State<ChatHandlers>,
    RequireUser(user_id): RequireUser,
    Path(assistant_id): Path<String>,
) -> Result<Response, ApiError> {
    let assistant_id = AssistantId::new(assistant_id)
        .map_err(|e| ChatError::Validation(e.to_string()))?;
    let decision = handlers
        .check_access
        .handle(CheckAccessQuery {
            user_id,
            assistant_id,
        })
        .await?;
    Ok(Json(decision).into_response())
}

/// POST /api/threads - Open a thread with an assistant
pub async fn create_thread(
    State(handlers): State<ChatHandlers>,
    RequireUser(user_id): RequireUser,
    Json(req): Json<CreateThreadRequest>,
) -> Result<Response, ApiError> {
    let assistant_id = AssistantId::new(req.assistant_id)
        .map_err(|e| ChatError::Validation(e.to_string()))?;
    let thread = handlers
        .create_thread
        .handle(CreateThreadCommand {
            user_id,
            assistant_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ThreadResponse::from(&thread))).into_response())
}

/// GET /api/threads - The caller's threads, most recent first
pub async fn list_threads(
    State(handlers): State<ChatHandlers>,
    RequireUser(user_id): RequireUser,
) -> Result<Response, ApiError> {
    let threads = handlers
        .list_threads
        .handle(ListThreadsQuery { user_id })
        .await?;
    let body: Vec<ThreadResponse> = threads.iter().map(ThreadResponse::from).collect();
    Ok(Json(body).into_response())
}

/// PATCH /api/threads/:thread_id - Rename a thread
pub async fn rename_thread(
    State(handlers): State<ChatHandlers>,
    RequireUser(user_id): RequireUser,
    Path(thread_id): Path<String>,
    Json(req): Json<RenameThreadRequest>,
) -> Result<Response, ApiError> {
    let thread = handlers
        .rename_thread
        .handle(RenameThreadCommand {
            thread_id: parse_thread_id(&thread_id)?,
            user_id,
            name: req.name,
        })
        .await?;
    Ok(Json(ThreadResponse::from(&thread)).into_response())
}

/// DELETE /api/threads/:thread_id - Soft-delete a thread and its messages
pub async fn delete_thread(
    State(handlers): State<ChatHandlers>,
    RequireUser(user_id): RequireUser,
    Path(thread_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    handlers
        .delete_thread
        .handle(DeleteThreadCommand {
            thread_id: parse_thread_id(&thread_id)?,
            user_id,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/threads/:thread_id/messages - Messages in insertion order
pub async fn list_messages(
    State(handlers): State<ChatHandlers>,
    RequireUser(user_id): RequireUser,
    Path(thread_id): Path<String>,
) -> Result<Response, ApiError> {
    let messages = handlers
        .list_messages
        .handle(ListMessagesQuery {
            thread_id: parse_thread_id(&thread_id)?,
            user_id,
        })
        .await?;
    let body: Vec<MessageResponse> = messages.iter().map(MessageResponse::from).collect();
    Ok(Json(body).into_response())
}

/// POST /api/conversations/:handle/turns - Append a user turn
pub async fn post_user_turn(
    State(handlers): State<ChatHandlers>,
    RequireUser(user_id): RequireUser,
    Path(handle): Path<String>,
    Json(req): Json<PostTurnRequest>,
) -> Result<StatusCode, ApiError> {
    handlers
        .post_user_turn
        .handle(PostUserTurnCommand {
            handle: parse_handle(handle)?,
            user_id,
            content: req.content,
        })
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// GET /api/conversations/:handle/stream - Assistant response as Server-Sent Events
///
/// Every precondition is checked before the response starts; once streaming,
/// failures arrive as an `error` event.
pub async fn stream_assistant(
    State(handlers): State<ChatHandlers>,
    RequireUser(user_id): RequireUser,
    Path(handle): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let stream = handlers
        .open_stream
        .handle(OpenAssistantStreamCommand {
            handle: parse_handle(handle)?,
            user_id,
        })
        .await?;

    let events = stream.map(|event| Ok::<_, Infallible>(to_sse_event(&event)));
    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

/// POST /api/conversations/:handle/name - Generate a thread name
pub async fn generate_thread_name(
    State(handlers): State<ChatHandlers>,
    RequireUser(user_id): RequireUser,
    Path(handle): Path<String>,
) -> Result<Response, ApiError> {
    let name = handlers
        .generate_name
        .handle(GenerateThreadNameCommand {
            handle: parse_handle(handle)?,
            user_id,
        })
        .await?;
    Ok(Json(ThreadNameResponse { name }).into_response())
}

/// GET /api/usage - Current period usage and costs
pub async fn get_usage(
    State(handlers): State<ChatHandlers>,
    RequireUser(user_id): RequireUser,
) -> Result<Response, ApiError> {
    let report = handlers.get_usage.handle(GetUsageQuery { user_id }).await?;
    Ok(Json(report).into_response())
}

fn parse_thread_id(raw: &str) -> Result<ThreadId, ApiError> {
    raw.parse::<ThreadId>()
        .map_err(|_| ApiError(ChatError::Validation("Invalid thread ID".to_string())))
}

fn parse_handle(raw: String) -> Result<ProviderThreadHandle, ApiError> {
    ProviderThreadHandle::new(raw).map_err(|e| ApiError(ChatError::Validation(e.to_string())))
}

fn to_sse_event(event: &StreamEvent) -> Event {
    Event::default()
        .event(event.name())
        .json_data(event)
        .unwrap_or_else(|e| {
            warn!(error = %e, "failed to encode stream event");
            Event::default()
                .event("error")
                .data(r#"{"type":"error","code":"encoding_failed","message":"event could not be encoded"}"#)
        })
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

/// HTTP rendering of [`ChatError`].
#[derive(Debug)]
pub struct ApiError(pub ChatError);

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            ChatError::AccessDenied(denial) => {
                (StatusCode::FORBIDDEN, Json(ErrorResponse::denied(&denial))).into_response()
            }
            ChatError::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::not_found(resource, &id)),
            )
                .into_response(),
            ChatError::Validation(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::bad_request(message))).into_response()
            }
            ChatError::Upstream(err) => {
                warn!(error = %err, "provider call failed");
                let status = match &err {
                    AIError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                    AIError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                    AIError::NotFound(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, Json(ErrorResponse::upstream(err.code(), err.to_string()))).into_response()
            }
            ChatError::Storage(err) => {
                error!(error = %err, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::internal("Internal storage error")),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::{AssistantSnapshot, Denial, DenialReason};
    use crate::domain::foundation::DomainError;

    #[test]
    fn denial_maps_to_403() {
        let denial = Denial::new(
            DenialReason::NoSubscription { suggested_products: vec![] },
            AssistantSnapshot {
                id: AssistantId::new("asst_avionics").unwrap(),
                name: None,
                required_product: None,
            },
            None,
            None,
        );
        let response = ApiError(ChatError::denied(denial)).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError(ChatError::thread_not_found("abc")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn rate_limit_maps_to_429() {
        let response = ApiError(ChatError::Upstream(AIError::rate_limited(10))).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn storage_maps_to_500() {
        let response =
            ApiError(ChatError::Storage(DomainError::database("down"))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_thread_id_is_rejected() {
        assert!(parse_thread_id("not-a-uuid").is_err());
    }
}

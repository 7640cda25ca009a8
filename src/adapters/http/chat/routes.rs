//! HTTP routes for chat endpoints.

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers::{
    check_access, create_thread, delete_thread, generate_thread_name, get_usage,
    list_assistants, list_messages, list_threads, post_user_turn, rename_thread,
    stream_assistant, ChatHandlers,
};

/// Creates the chat router with all endpoints. Mount under `/api`.
pub fn chat_routes(handlers: ChatHandlers) -> Router {
    Router::new()
        .route("/assistants", get(list_assistants))
        .route("/assistants/:assistant_id/access", get(check_access))
        .route("/threads", post(create_thread).get(list_threads))
        .route("/threads/:thread_id", patch(rename_thread).delete(delete_thread))
        .route("/threads/:thread_id/messages", get(list_messages))
        .route("/conversations/:handle/turns", post(post_user_turn))
        .route("/conversations/:handle/stream", get(stream_assistant))
        .route("/conversations/:handle/name", post(generate_thread_name))
        .route("/usage", get(get_usage))
        .with_state(handlers)
}

//! HTTP adapter for chat endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CreateThreadRequest, ErrorResponse, MessageResponse, PostTurnRequest, RenameThreadRequest,
    ThreadNameResponse, ThreadResponse,
};
pub use handlers::{ApiError, ChatHandlers};
pub use routes::chat_routes;

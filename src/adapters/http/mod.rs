//! HTTP adapters - REST API implementations.
//!
//! Chat endpoints plus the identity extractor they share.

pub mod chat;
pub mod middleware;

// Re-export key types for convenience
pub use chat::{chat_routes, ApiError, ChatHandlers};
pub use middleware::RequireUser;

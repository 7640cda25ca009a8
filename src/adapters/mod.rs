//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - OpenAI Assistants API and a scripted provider
//! - `http` - axum routes, SSE streaming, identity extraction
//! - `memory` - In-memory stores for development and tests
//! - `postgres` - sqlx-backed stores

pub mod ai;
pub mod http;
pub mod memory;
pub mod postgres;

//! HTTP middleware for axum.
//!
//! This module contains extractors for cross-cutting concerns:
//!
//! - `identity` - Caller identity supplied by the upstream gateway

pub mod identity;

pub use identity::{IdentityRejection, RequireUser, USER_ID_HEADER};

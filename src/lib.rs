//! Assistant Hub - subscription-gated streaming chat with hosted assistants
//!
//! Users converse with domain-specific assistants. Every turn is checked
//! against the user's subscription and token allowance, streamed back as it
//! is generated, then persisted, classified by topic and metered.

pub mod adapters;
pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

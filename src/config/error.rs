//! Configuration error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid contents in {path}: {message}")]
    InvalidFile { path: PathBuf, message: String },
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Bind host must be an IP address, got {0:?}")]
    InvalidBindHost(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Shutdown grace period exceeds 120 seconds")]
    InvalidShutdownGrace,

    #[error("CORS origin must be an http(s) URL, got {0:?}")]
    InvalidCorsOrigin(String),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("AI base URL must be http(s)")]
    InvalidBaseUrl,

    #[error("AI base URL must use HTTPS in production")]
    BaseUrlMustBeHttps,

    #[error("The mock assistant backend cannot run in production")]
    MockBackendInProduction,

    #[error("Stream buffer must be between 1 and 1024 events")]
    InvalidStreamBuffer,
}

//! HTTP listener settings.
//!
//! Every field has a default, so an absent `server` section is valid.

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use super::error::ValidationError;

const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;
const MAX_SHUTDOWN_GRACE_SECS: u64 = 120;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface address, not a hostname.
    pub host: String,
    pub port: u16,
    pub environment: Environment,

    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Bounds time to response head. Assistant streams are never cut off.
    pub request_timeout_secs: u64,

    /// How long shutdown waits for in-flight settlements.
    pub shutdown_grace_secs: u64,

    /// Comma-separated browser origins allowed to call the API.
    pub cors_origins: Option<String>,
}

/// Deployment stage. Production tightens CORS and AI backend checks.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Which browser origins may call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Any origin; only outside production.
    AllowAny,
    /// No cross-origin access.
    Closed,
    Origins(Vec<String>),
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::Development,
            log_level: "info,assistant_hub=debug,sqlx=warn".to_string(),
            request_timeout_secs: 30,
            shutdown_grace_secs: 10,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ValidationError> {
        let ip: IpAddr = self
            .host
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidBindHost(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Listed origins win; with none listed, production is closed and
    /// other stages allow any origin.
    pub fn cors_policy(&self) -> CorsPolicy {
        let origins = self.listed_origins();
        if !origins.is_empty() {
            CorsPolicy::Origins(origins)
        } else if self.is_production() {
            CorsPolicy::Closed
        } else {
            CorsPolicy::AllowAny
        }
    }

    fn listed_origins(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        self.bind_addr()?;
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.shutdown_grace_secs > MAX_SHUTDOWN_GRACE_SECS {
            return Err(ValidationError::InvalidShutdownGrace);
        }
        if let Some(origin) = self
            .listed_origins()
            .into_iter()
            .find(|o| !(o.starts_with("http://") || o.starts_with("https://")))
        {
            return Err(ValidationError::InvalidCorsOrigin(origin));
        }
        Ok(())
    }
}

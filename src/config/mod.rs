//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables carry the `ASSISTANT_HUB` prefix
//! and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use assistant_hub::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.bind_addr());
//! ```

mod ai;
mod chat;
mod database;
mod error;
mod server;

pub use ai::{AiBackend, AiConfig};
pub use chat::ChatConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{CorsPolicy, Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection. In-memory stores are used when absent.
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub chat: ChatConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ASSISTANT_HUB` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `ASSISTANT_HUB__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ASSISTANT_HUB__AI__API_KEY=sk-...` -> `ai.api_key = ...`
    /// - `ASSISTANT_HUB__CHAT__CATALOG_PATH=/etc/hub/catalog.yaml`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ASSISTANT_HUB")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.ai.validate(&self.server.environment)?;
        self.chat.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

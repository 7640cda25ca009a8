//! AI provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Which assistant backend serves conversations.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiBackend {
    #[default]
    OpenAI,
    /// Scripted in-process provider for local development.
    Mock,
}

/// `Secret` is not `Clone`, so neither is this section.
#[derive(Debug, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub backend: AiBackend,

    pub api_key: Option<Secret<String>>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model for topic classification of completed turns
    #[serde(default = "default_classifier_model")]
    pub classifier_model: String,

    /// Model for thread title generation
    #[serde(default = "default_naming_model")]
    pub naming_model: String,

    /// Request timeout in seconds for one-shot calls; streamed runs are unbounded
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        match self.backend {
            AiBackend::Mock if *environment == Environment::Production => {
                return Err(ValidationError::MockBackendInProduction);
            }
            AiBackend::Mock => return Ok(()),
            AiBackend::OpenAI => {}
        }

        if !self.has_api_key() {
            return Err(ValidationError::MissingRequired("AI__API_KEY"));
        }
        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(ValidationError::InvalidBaseUrl);
        }
        if *environment == Environment::Production && !self.base_url.starts_with("https://") {
            return Err(ValidationError::BaseUrlMustBeHttps);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: AiBackend::default(),
            api_key: None,
            base_url: default_base_url(),
            classifier_model: default_classifier_model(),
            naming_model: default_naming_model(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_classifier_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_naming_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    2
}

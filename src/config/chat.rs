//! Chat runtime configuration: stream buffering and the catalog and pricing
//! sources.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, ValidationError};
use crate::domain::catalog::{AssistantCatalog, BUILTIN_CATALOG};
use crate::domain::usage::{PricingTable, DEFAULT_PRICING};

const MAX_STREAM_BUFFER: usize = 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Events buffered between the provider pump and a slow consumer
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,

    /// YAML catalog (`assistants: [...]`). Built-in catalog when unset.
    pub catalog_path: Option<PathBuf>,

    /// YAML pricing table. Built-in table when unset.
    pub pricing_path: Option<PathBuf>,
}

impl ChatConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stream_buffer == 0 || self.stream_buffer > MAX_STREAM_BUFFER {
            return Err(ValidationError::InvalidStreamBuffer);
        }
        Ok(())
    }

    /// Reads the configured catalog, or the built-in one.
    ///
    /// # Errors
    ///
    /// `Unreadable` when the file cannot be read, `InvalidFile` when it does
    /// not parse or lists no assistants.
    pub fn load_catalog(&self) -> Result<AssistantCatalog, ConfigError> {
        let Some(path) = &self.catalog_path else {
            return Ok(BUILTIN_CATALOG.clone());
        };
        let catalog = AssistantCatalog::from_yaml(&read(path)?).map_err(|e| invalid(path, e))?;
        if catalog.is_empty() {
            return Err(invalid(path, "catalog lists no assistants"));
        }
        Ok(catalog)
    }

    /// Reads the configured pricing table, or the built-in one.
    pub fn load_pricing(&self) -> Result<PricingTable, ConfigError> {
        match &self.pricing_path {
            Some(path) => PricingTable::from_yaml(&read(path)?).map_err(|e| invalid(path, e)),
            None => Ok(DEFAULT_PRICING.clone()),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            stream_buffer: default_stream_buffer(),
            catalog_path: None,
            pricing_path: None,
        }
    }
}

fn default_stream_buffer() -> usize {
    64
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}

fn invalid(path: &Path, message: impl ToString) -> ConfigError {
    ConfigError::InvalidFile {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn unset_paths_fall_back_to_builtins() {
        let config = ChatConfig::default();
        assert_eq!(config.load_catalog().unwrap().len(), BUILTIN_CATALOG.len());
        assert_eq!(config.load_pricing().unwrap(), *DEFAULT_PRICING);
    }

    #[test]
    fn loads_catalog_from_file() {
        let file = yaml_file(
            "assistants:\n  - id: asst_hangar\n    label: Hangar Planner\n    required_product: prod_hangar\n",
        );
        let config = ChatConfig {
            catalog_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };

        let catalog = config.load_catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        let entry = catalog.iter().next().unwrap();
        assert_eq!(entry.label, "Hangar Planner");
        assert!(entry.example_prompts.is_empty());
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let file = yaml_file("assistants: []\n");
        let config = ChatConfig {
            catalog_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(matches!(config.load_catalog(), Err(ConfigError::InvalidFile { .. })));
    }

    #[test]
    fn loads_pricing_from_file() {
        let file = yaml_file(
            "version: \"2024-10\"\nmodels:\n  gpt-4o:\n    input_cents_per_million: 200\n    output_cents_per_million: 800\nfallback:\n  input_cents_per_million: 1\n  output_cents_per_million: 2\n",
        );
        let config = ChatConfig {
            pricing_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };

        let table = config.load_pricing().unwrap();
        assert_eq!(table.version, "2024-10");
        assert_eq!(table.price_for("gpt-4o").input_cents_per_million, 200);
    }

    #[test]
    fn malformed_pricing_names_the_file() {
        let file = yaml_file("version: [unterminated\n");
        let config = ChatConfig {
            pricing_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        match config.load_pricing() {
            Err(ConfigError::InvalidFile { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("expected InvalidFile, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_unreadable() {
        let config = ChatConfig {
            catalog_path: Some(PathBuf::from("/nonexistent/catalog.yaml")),
            ..Default::default()
        };
        assert!(matches!(config.load_catalog(), Err(ConfigError::Unreadable { .. })));
    }

    #[test]
    fn stream_buffer_bounds() {
        let zero = ChatConfig {
            stream_buffer: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
        assert!(ChatConfig::default().validate().is_ok());
    }
}

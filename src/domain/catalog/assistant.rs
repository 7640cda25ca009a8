//! Static assistant catalog.
//!
//! Each entry maps a provider-hosted assistant to the product a subscription
//! must include for the user to talk to it. The catalog is built once at
//! start-up and shared read-only afterwards.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::foundation::{AssistantId, ProductId, ValidationError};

/// Catalog entry for a single assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantDescriptor {
    /// Provider-side assistant identifier.
    pub id: AssistantId,
    /// Human-readable name shown in the UI.
    pub label: String,
    /// Product that must be part of the user's subscription.
    pub required_product: ProductId,
    /// Suggested opening questions.
    #[serde(default)]
    pub example_prompts: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    assistants: Vec<AssistantDescriptor>,
}

/// Immutable lookup table of every known assistant.
#[derive(Debug, Clone, Default)]
pub struct AssistantCatalog {
    entries: Vec<AssistantDescriptor>,
}

impl AssistantCatalog {
    /// Builds a catalog, rejecting duplicate assistant ids.
    pub fn new(entries: Vec<AssistantDescriptor>) -> Result<Self, ValidationError> {
        let mut seen = BTreeSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(ValidationError::invalid_format(
                    "assistants",
                    format!("duplicate assistant id '{}'", entry.id),
                ));
            }
            if entry.label.trim().is_empty() {
                return Err(ValidationError::empty_field("label"));
            }
        }
        Ok(Self { entries })
    }

    /// Parses a catalog from YAML of the form `assistants: [ ... ]`.
    pub fn from_yaml(source: &str) -> Result<Self, ValidationError> {
        let file: CatalogFile = serde_yaml::from_str(source)
            .map_err(|e| ValidationError::invalid_format("assistants", e.to_string()))?;
        Self::new(file.assistants)
    }

    /// Looks up an assistant by id.
    pub fn get(&self, id: &AssistantId) -> Option<&AssistantDescriptor> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    /// Every distinct product referenced by the catalog, in stable order.
    pub fn products(&self) -> Vec<ProductId> {
        let unique: BTreeSet<&ProductId> =
            self.entries.iter().map(|e| &e.required_product).collect();
        unique.into_iter().cloned().collect()
    }

    /// Iterates over all entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &AssistantDescriptor> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const BUILTIN_CATALOG: &str = r#"
assistants:
  - id: asst_line_maintenance
    label: Line Maintenance Advisor
    required_product: prod_maintenance
    example_prompts:
      - "What does a PACK 1 FAULT caution usually indicate?"
      - "Walk me through a hydraulic reservoir servicing check."
  - id: asst_avionics
    label: Avionics Troubleshooter
    required_product: prod_avionics
    example_prompts:
      - "Why would an ADIRU fail to align on the ground?"
  - id: asst_regulatory
    label: Airworthiness Regulations Guide
    required_product: prod_regulatory
    example_prompts:
      - "When is an MEL item deferral allowed?"
"#;

/// Catalog used when no catalog file is configured.
pub static BUILTIN: Lazy<AssistantCatalog> = Lazy::new(|| {
    AssistantCatalog::from_yaml(BUILTIN_CATALOG).unwrap_or_default()
});

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str, product: &str) -> AssistantDescriptor {
        AssistantDescriptor {
            id: AssistantId::new(id).unwrap(),
            label: format!("{} label", id),
            required_product: ProductId::new(product).unwrap(),
            example_prompts: vec![],
        }
    }

    #[test]
    fn builtin_catalog_parses() {
        assert_eq!(BUILTIN.len(), 3);
        let id = AssistantId::new("asst_avionics").unwrap();
        let entry = BUILTIN.get(&id).unwrap();
        assert_eq!(entry.required_product.as_str(), "prod_avionics");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = AssistantCatalog::new(vec![
            descriptor("asst_a", "prod_x"),
            descriptor("asst_a", "prod_y"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn products_are_deduplicated() {
        let catalog = AssistantCatalog::new(vec![
            descriptor("asst_a", "prod_x"),
            descriptor("asst_b", "prod_x"),
            descriptor("asst_c", "prod_y"),
        ])
        .unwrap();

        let products = catalog.products();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].as_str(), "prod_x");
        assert_eq!(products[1].as_str(), "prod_y");
    }

    #[test]
    fn unknown_assistant_is_none() {
        let id = AssistantId::new("asst_missing").unwrap();
        assert!(BUILTIN.get(&id).is_none());
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        assert!(AssistantCatalog::from_yaml("assistants: 12").is_err());
    }
}

//! ListAssistantsHandler - Query handler for the assistant catalog.

use std::sync::Arc;

use crate::domain::catalog::{AssistantCatalog, AssistantDescriptor};

pub struct ListAssistantsHandler {
    catalog: Arc<AssistantCatalog>,
}

impl ListAssistantsHandler {
    pub fn new(catalog: Arc<AssistantCatalog>) -> Self {
        Self { catalog }
    }

    pub fn handle(&self) -> Vec<AssistantDescriptor> {
        self.catalog.iter().cloned().collect()
    }
}

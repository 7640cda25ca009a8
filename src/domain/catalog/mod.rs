//! Assistant catalog domain module.

mod assistant;

pub use assistant::{AssistantCatalog, AssistantDescriptor, BUILTIN as BUILTIN_CATALOG};

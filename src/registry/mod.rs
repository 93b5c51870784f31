//! Tool Registry - descriptors, catalog loading and the immutable registry

mod catalog;
mod descriptor;
mod tool_registry;

pub use descriptor::{ActionDescriptor, ParamKind, ParamSpec, ToolDescriptor};
pub use tool_registry::{ToolRegistry, ToolRegistryBuilder};

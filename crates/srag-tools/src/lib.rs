//! Tool framework for the SRAG report agent
//!
//! Defines the closed set of named, schema-described actions the
//! orchestration loop can dispatch, and the registry that resolves a model
//! tool request by name.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::Tool;

//! Tool trait definition

use async_trait::async_trait;
use serde_json::Value;
use srag_core::Result;

/// Trait for the callable actions exposed to the LLM
///
/// Each tool wraps one collaborator operation (metrics, charts, news,
/// statistics, report assembly) behind a name, a natural-language
/// description, and a JSON input schema.
///
/// Tool implementations absorb their collaborator's failures: a failing
/// collaborator produces a descriptive failure string as the tool's
/// (successful) payload. The orchestration loop never receives a raw
/// collaborator error through `execute`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with given parameters
    ///
    /// # Arguments
    ///
    /// * `params` - Tool input as JSON value (should match `input_schema`)
    ///
    /// # Returns
    ///
    /// Tool output as JSON value, normally a text payload
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Get the tool's name
    ///
    /// Must be unique within a `ToolRegistry`.
    fn name(&self) -> &str;

    /// Get the tool's description
    ///
    /// This description tells the LLM when to use this tool.
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema format)
    fn input_schema(&self) -> Value;
}

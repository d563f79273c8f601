//! Orchestration runtime for the SRAG report agent
//!
//! Hosts the bounded agent loop: model completions in, tool dispatch out,
//! with an audit trail over the whole exchange.

pub mod orchestrator;
pub mod prompt;

pub use orchestrator::{Orchestrator, OrchestratorConfig, TaskOutcome};
pub use prompt::{REPORT_TASK, SYSTEM_PROMPT};

//! Core abstractions for the SRAG report agent
//!
//! This crate defines the error taxonomy shared across the workspace, the
//! append-only audit trail every component writes to, and the tracing setup
//! used by the binaries.

pub mod audit;
pub mod error;
pub mod logging;

pub use audit::{AuditEntry, AuditLog};
pub use error::{Error, Result};
pub use logging::init_tracing;

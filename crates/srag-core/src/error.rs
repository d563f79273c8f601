//! Error types shared across the SRAG agent workspace

use thiserror::Error;

/// Result type alias for srag-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
///
/// Domain crates define their own richer error enums and bridge into this
/// one at the crate boundary. The orchestration loop only ever deals with
/// these variants.
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Component initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Processing failed
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    /// The orchestration loop hit its iteration ceiling
    #[error("Iteration limit of {0} exceeded without completion")]
    IterationLimitExceeded(usize),
}

//! Error types for the SRAG domain

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for SRAG domain operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// SRAG domain errors
#[derive(Debug, Error)]
pub enum ReportError {
    /// The query guard refused the statement. User-facing, not retried.
    #[error("Query não permitida: {0}")]
    RejectedQuery(String),

    /// The backing store file does not exist. Fatal at construction.
    #[error(
        "Banco de dados não encontrado: {}. Execute primeiro o pré-processamento dos dados.",
        .0.display()
    )]
    StoreNotFound(PathBuf),

    /// SQLite error
    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Template rendering error
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A query returned no usable rows
    #[error("No data: {0}")]
    NoData(String),
}

/// Convert domain errors into the workspace error type at the crate boundary
impl From<ReportError> for srag_core::Error {
    fn from(err: ReportError) -> Self {
        srag_core::Error::ProcessingFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_message_names_preprocessing() {
        let err = ReportError::StoreNotFound(PathBuf::from("data/processed/srag.db"));
        let msg = err.to_string();
        assert!(msg.contains("srag.db"));
        assert!(msg.contains("pré-processamento"));
    }

    #[test]
    fn test_rejected_query_display() {
        let err = ReportError::RejectedQuery("apenas SELECT é aceito".to_string());
        assert!(err.to_string().starts_with("Query não permitida"));
    }
}

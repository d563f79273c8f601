//! Append-only audit trail
//!
//! Every externally visible action in the system (query execution, model
//! responses, task boundaries) is recorded here. The log only supports
//! appending and snapshotting; entries are never mutated or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::info;

/// A single audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the action happened
    pub timestamp: DateTime<Utc>,

    /// Action kind (e.g. "query_executada", "resposta_agente")
    pub action: String,

    /// Free-form JSON details for the action
    pub details: Value,
}

/// Shared handle to an append-only sequence of audit entries
///
/// Cloning the handle shares the underlying log. One log instance lives for
/// the duration of a task execution and is returned to the caller when the
/// task ends.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl AuditLog {
    /// Create a new empty audit log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the log
    pub fn record(&self, action: impl Into<String>, details: Value) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            action: action.into(),
            details,
        };
        info!(action = %entry.action, details = %entry.details, "AUDITORIA");
        let mut entries = self.entries.lock().unwrap();
        entries.push(entry);
    }

    /// Copy out the entries recorded so far, in append order
    pub fn snapshot(&self) -> Vec<AuditEntry> {
        let entries = self.entries.lock().unwrap();
        entries.clone()
    }

    /// Get the number of recorded entries
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap();
        entries.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        let entries = self.entries.lock().unwrap();
        entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_and_snapshot() {
        let log = AuditLog::new();
        assert!(log.is_empty());

        log.record("inicio_execucao", json!({"tarefa": "relatorio"}));
        log.record("fim_execucao", json!({"status": "sucesso"}));

        let entries = log.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "inicio_execucao");
        assert_eq!(entries[1].action, "fim_execucao");
        assert!(entries[0].timestamp <= entries[1].timestamp);
    }

    #[test]
    fn test_clone_shares_log() {
        let log = AuditLog::new();
        let handle = log.clone();

        handle.record("query_executada", json!({"sucesso": true}));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_entry_serialization() {
        let log = AuditLog::new();
        log.record("resposta_agente", json!({"tipo": "tool_call"}));

        let entry = &log.snapshot()[0];
        let serialized = serde_json::to_string(entry).unwrap();
        let deserialized: AuditEntry = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.action, "resposta_agente");
    }
}

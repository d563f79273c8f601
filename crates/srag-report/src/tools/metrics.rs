//! Metric calculation tool

use crate::metrics::MetricsEngine;
use async_trait::async_trait;
use serde_json::Value;
use srag_llm::tools::schema;
use srag_tools::Tool;
use std::sync::Arc;
use tracing::warn;

/// `calcular_metricas_srag` - computes the four decision metrics
pub struct CalculateMetricsTool {
    engine: Arc<MetricsEngine>,
}

impl CalculateMetricsTool {
    pub fn new(engine: Arc<MetricsEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Tool for CalculateMetricsTool {
    async fn execute(&self, _params: Value) -> srag_core::Result<Value> {
        let text = match self.engine.summary() {
            Ok(summary) => summary,
            Err(err) => {
                warn!(error = %err, "Falha no cálculo de métricas");
                format!("Erro ao calcular métricas: {err}")
            }
        };
        Ok(Value::String(text))
    }

    fn name(&self) -> &str {
        "calcular_metricas_srag"
    }

    fn description(&self) -> &str {
        "Calcula as quatro métricas de decisão do relatório SRAG: taxa de aumento de casos, \
         taxa de mortalidade, taxa de ocupação de UTI e taxa de vacinação. \
         Não recebe parâmetros."
    }

    fn input_schema(&self) -> Value {
        schema::empty_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreAccessor;
    use rusqlite::Connection;
    use serde_json::json;
    use srag_core::AuditLog;
    use tempfile::TempDir;

    fn tool_over_rows(rows: &[(&str, i64, i64, i64)]) -> (TempDir, CalculateMetricsTool) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("srag.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "CREATE TABLE srag (
                DT_NOTIFIC TEXT, EVOLUCAO INTEGER, HOSPITAL INTEGER, UTI INTEGER,
                VACINA_COV INTEGER, VACINA INTEGER, SG_UF_NOT TEXT
            )",
            [],
        )
        .unwrap();
        for (date, outcome, hospital, icu) in rows {
            conn.execute(
                "INSERT INTO srag VALUES (?1, ?2, ?3, ?4, 1, 1, 'SP')",
                rusqlite::params![date, outcome, hospital, icu],
            )
            .unwrap();
        }
        let store = Arc::new(StoreAccessor::open(&path, AuditLog::new()).unwrap());
        let tool = CalculateMetricsTool::new(Arc::new(MetricsEngine::new(store, 7)));
        (dir, tool)
    }

    #[tokio::test]
    async fn test_returns_metrics_summary_text() {
        let (_dir, tool) = tool_over_rows(&[("2024-03-30", 2, 1, 1), ("2024-03-31", 1, 1, 2)]);

        let result = tool.execute(json!({})).await.unwrap();
        let text = result.as_str().unwrap();
        assert!(text.contains("MÉTRICAS SRAG"));
        assert!(text.contains("Taxa de Mortalidade"));
    }

    #[test]
    fn test_tool_identity() {
        let (_dir, tool) = tool_over_rows(&[]);
        assert_eq!(tool.name(), "calcular_metricas_srag");
        assert_eq!(tool.input_schema()["type"], "object");
    }
}

//! Store statistics tool

use crate::store::StoreAccessor;
use async_trait::async_trait;
use serde_json::{Value, json};
use srag_llm::tools::schema;
use srag_tools::Tool;
use std::sync::Arc;
use tracing::warn;

/// `consultar_estatisticas_banco` - general statistics, optionally filtered
pub struct QueryStatisticsTool {
    store: Arc<StoreAccessor>,
}

impl QueryStatisticsTool {
    pub fn new(store: Arc<StoreAccessor>) -> Self {
        Self { store }
    }

    fn statistics_text(&self, filter: Option<&str>) -> String {
        if let Some(filter) = filter {
            return match self.store.count_records(Some(filter)) {
                Ok(count) => {
                    format!("Registros que atendem ao filtro '{filter}': {count}")
                }
                Err(err) => {
                    warn!(error = %err, "Falha na consulta filtrada");
                    format!("Erro ao consultar com o filtro '{filter}': {err}")
                }
            };
        }

        match self.store.general_statistics() {
            Ok(stats) => format!(
                "=== ESTATÍSTICAS DO BANCO SRAG ===\n\
                 Total de registros: {}\n\
                 Estados notificantes: {}\n\
                 Primeira notificação: {}\n\
                 Última notificação: {}",
                stats.total_records,
                stats.region_count,
                stats.first_notification.as_deref().unwrap_or("—"),
                stats.last_notification.as_deref().unwrap_or("—"),
            ),
            Err(err) => {
                warn!(error = %err, "Falha na consulta de estatísticas");
                format!("Erro ao consultar estatísticas do banco: {err}")
            }
        }
    }
}

#[async_trait]
impl Tool for QueryStatisticsTool {
    async fn execute(&self, params: Value) -> srag_core::Result<Value> {
        let filter = params
            .get("filtro")
            .and_then(Value::as_str)
            .filter(|f| !f.trim().is_empty());
        Ok(Value::String(self.statistics_text(filter)))
    }

    fn name(&self) -> &str {
        "consultar_estatisticas_banco"
    }

    fn description(&self) -> &str {
        "Consulta estatísticas gerais do banco de dados SRAG: total de registros, estados \
         notificantes e intervalo de datas. Aceita um filtro SQL opcional no parâmetro \
         'filtro' (ex: \"SG_UF_NOT = 'SP'\") para contar registros."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "filtro": schema::string(
                    "Condição SQL opcional aplicada à contagem de registros"
                ),
            }),
            vec![],
        )
    }
}

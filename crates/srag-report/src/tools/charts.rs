//! Chart generation tool

use crate::charts::ChartGenerator;
use crate::store::StoreAccessor;
use async_trait::async_trait;
use serde_json::Value;
use srag_llm::tools::schema;
use srag_tools::Tool;
use std::sync::Arc;
use tracing::warn;

/// `gerar_graficos_srag` - renders the daily and monthly case charts
pub struct GenerateChartsTool {
    store: Arc<StoreAccessor>,
    generator: ChartGenerator,
    chart_days: u32,
    chart_months: u32,
}

impl GenerateChartsTool {
    pub fn new(
        store: Arc<StoreAccessor>,
        generator: ChartGenerator,
        chart_days: u32,
        chart_months: u32,
    ) -> Self {
        Self {
            store,
            generator,
            chart_days,
            chart_months,
        }
    }

    fn generate(&self) -> Vec<String> {
        let mut lines = Vec::new();

        match self
            .store
            .daily_cases(self.chart_days)
            .and_then(|series| self.generator.daily_cases_chart(&series))
        {
            Ok(path) => lines.push(format!("Gráfico de casos diários gerado: {}", path.display())),
            Err(err) => {
                warn!(error = %err, "Falha no gráfico diário");
                lines.push(format!("Erro ao gerar gráfico de casos diários: {err}"));
            }
        }

        match self
            .store
            .monthly_cases(self.chart_months)
            .and_then(|series| self.generator.monthly_cases_chart(&series))
        {
            Ok(path) => lines.push(format!("Gráfico de casos mensais gerado: {}", path.display())),
            Err(err) => {
                warn!(error = %err, "Falha no gráfico mensal");
                lines.push(format!("Erro ao gerar gráfico de casos mensais: {err}"));
            }
        }

        lines
    }
}

#[async_trait]
impl Tool for GenerateChartsTool {
    async fn execute(&self, _params: Value) -> srag_core::Result<Value> {
        Ok(Value::String(self.generate().join("\n")))
    }

    fn name(&self) -> &str {
        "gerar_graficos_srag"
    }

    fn description(&self) -> &str {
        "Gera os gráficos do relatório SRAG: casos diários dos últimos 30 dias e casos \
         mensais dos últimos 12 meses de dados. Não recebe parâmetros."
    }

    fn input_schema(&self) -> Value {
        schema::empty_object()
    }
}

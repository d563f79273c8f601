//! Report assembly tool
//!
//! The terminal tool of a report run: gathers metrics, statistics, charts
//! and news, renders the final document, and answers with its path. The
//! system prompt instructs the model to stop after calling it.

use crate::charts::ChartGenerator;
use crate::config::SragConfig;
use crate::document::{ReportAssembler, ReportInputs};
use crate::metrics::MetricsEngine;
use crate::news::NewsClient;
use crate::store::StoreAccessor;
use async_trait::async_trait;
use serde_json::{Value, json};
use srag_llm::tools::schema;
use srag_tools::Tool;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// `gerar_relatorio_pdf` - assembles and writes the final report document
pub struct GenerateReportTool {
    store: Arc<StoreAccessor>,
    engine: Arc<MetricsEngine>,
    news: Arc<NewsClient>,
    charts: ChartGenerator,
    assembler: ReportAssembler,
    chart_days: u32,
    chart_months: u32,
}

impl GenerateReportTool {
    pub fn new(
        store: Arc<StoreAccessor>,
        engine: Arc<MetricsEngine>,
        news: Arc<NewsClient>,
        config: &SragConfig,
    ) -> crate::Result<Self> {
        Ok(Self {
            store,
            engine,
            news,
            charts: ChartGenerator::new(config.charts_dir.clone()),
            assembler: ReportAssembler::new(config.reports_dir.clone())?,
            chart_days: config.chart_days,
            chart_months: config.chart_months,
        })
    }

    async fn gather_inputs(&self, analysis: Option<String>) -> ReportInputs {
        let mut inputs = ReportInputs {
            analysis,
            ..Default::default()
        };

        for (key, result) in self.engine.calculate_all() {
            match result {
                Ok(metric) => inputs.metrics.push(metric),
                Err(err) => inputs.metric_errors.push(format!("{key}: {err}")),
            }
        }

        match self.store.general_statistics() {
            Ok(stats) => inputs.statistics = Some(stats),
            Err(err) => warn!(error = %err, "Estatísticas indisponíveis para o relatório"),
        }

        inputs.charts = self.generate_charts();
        inputs.news = self.news.fetch_or_empty().await;
        inputs
    }

    /// Chart failures degrade the document, they never sink it
    fn generate_charts(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        match self
            .store
            .daily_cases(self.chart_days)
            .and_then(|series| self.charts.daily_cases_chart(&series))
        {
            Ok(path) => paths.push(path),
            Err(err) => warn!(error = %err, "Gráfico diário indisponível para o relatório"),
        }

        match self
            .store
            .monthly_cases(self.chart_months)
            .and_then(|series| self.charts.monthly_cases_chart(&series))
        {
            Ok(path) => paths.push(path),
            Err(err) => warn!(error = %err, "Gráfico mensal indisponível para o relatório"),
        }

        paths
    }
}

#[async_trait]
impl Tool for GenerateReportTool {
    async fn execute(&self, params: Value) -> srag_core::Result<Value> {
        let analysis = params
            .get("analise")
            .and_then(Value::as_str)
            .filter(|a| !a.trim().is_empty())
            .map(ToString::to_string);

        let inputs = self.gather_inputs(analysis).await;
        let text = match self.assembler.assemble(&inputs) {
            Ok(path) => {
                info!(path = %path.display(), "Relatório final pronto");
                format!(
                    "Relatório gerado com sucesso: {}. O relatório está completo; \
                     não chame mais ferramentas.",
                    path.display()
                )
            }
            Err(err) => {
                warn!(error = %err, "Falha ao montar o relatório");
                format!("Erro ao gerar o relatório: {err}")
            }
        };
        Ok(Value::String(text))
    }

    fn name(&self) -> &str {
        "gerar_relatorio_pdf"
    }

    fn description(&self) -> &str {
        "Gera o documento final do relatório SRAG com métricas, estatísticas, gráficos e \
         notícias. Aceita no parâmetro opcional 'analise' um texto de análise para incluir \
         no relatório. Chame esta ferramenta apenas uma vez, ao final do trabalho."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "analise": schema::string(
                    "Análise textual do cenário epidemiológico para incluir no relatório"
                ),
            }),
            vec![],
        )
    }
}

//! Report document assembly
//!
//! Renders the final report as a self-contained, print-ready HTML document
//! via a minijinja template. The assembler is pure presentation: it takes
//! already-computed inputs and never talks to the store or the network.

use crate::error::Result;
use crate::metrics::MetricResult;
use crate::news::NewsItem;
use crate::store::GeneralStatistics;
use chrono::Local;
use minijinja::{Environment, context};
use std::path::{Path, PathBuf};
use tracing::info;

const TEMPLATE: &str = include_str!("../templates/report.html");

/// Everything the final document renders
#[derive(Debug, Default)]
pub struct ReportInputs {
    /// Free-text analysis produced by the agent, if any
    pub analysis: Option<String>,
    /// Successfully computed metrics
    pub metrics: Vec<MetricResult>,
    /// Messages for metrics that failed to compute
    pub metric_errors: Vec<String>,
    /// General store statistics
    pub statistics: Option<GeneralStatistics>,
    /// News context, possibly empty
    pub news: Vec<NewsItem>,
    /// Chart files to embed
    pub charts: Vec<PathBuf>,
}

/// Renders report documents into the reports directory
pub struct ReportAssembler {
    reports_dir: PathBuf,
    env: Environment<'static>,
}

impl ReportAssembler {
    /// Create an assembler targeting `reports_dir`
    pub fn new(reports_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("report", TEMPLATE)?;
        Ok(Self {
            reports_dir: reports_dir.into(),
            env,
        })
    }

    /// Render the document and write it to disk
    ///
    /// Returns the path of the written file, named with a local timestamp
    /// so successive runs never overwrite each other.
    pub fn assemble(&self, inputs: &ReportInputs) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.reports_dir)?;

        let now = Local::now();
        let html = self.render(inputs, &now.format("%d/%m/%Y %H:%M").to_string())?;

        let file_name = format!("relatorio_srag_{}.html", now.format("%Y%m%d_%H%M%S"));
        let path = self.reports_dir.join(file_name);
        std::fs::write(&path, html)?;

        info!(path = %path.display(), "Relatório gerado");
        Ok(path)
    }

    fn render(&self, inputs: &ReportInputs, generated_at: &str) -> Result<String> {
        let charts: Vec<String> = inputs
            .charts
            .iter()
            .map(|p| self.relative_chart_path(p))
            .collect();

        // Values are pre-formatted here; the template stays free of
        // number-formatting logic.
        let metrics: Vec<serde_json::Value> = inputs
            .metrics
            .iter()
            .map(|m| {
                serde_json::json!({
                    "name": m.name,
                    "value_display": format!("{:.2}", m.value),
                    "unit": m.unit,
                    "description": m.description,
                })
            })
            .collect();

        let template = self.env.get_template("report")?;
        let html = template.render(context! {
            generated_at => generated_at,
            statistics => inputs.statistics,
            metrics => metrics,
            metric_errors => inputs.metric_errors,
            analysis => inputs.analysis,
            charts => charts,
            news => inputs.news,
        })?;
        Ok(html)
    }

    /// Charts live under the reports directory; reference them relatively
    /// so the document stays portable. Paths outside it stay absolute.
    fn relative_chart_path(&self, chart: &Path) -> String {
        chart
            .strip_prefix(&self.reports_dir)
            .unwrap_or(chart)
            .display()
            .to_string()
    }
}

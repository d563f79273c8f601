//! Configuration for the SRAG report agent

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the SRAG report pipeline
///
/// Severity-band thresholds live in `metrics::bands`; this struct carries
/// the operational knobs: paths, model, window sizes, and the iteration
/// ceiling for the orchestration loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SragConfig {
    /// Path to the processed SQLite store
    pub db_path: PathBuf,

    /// Directory for generated report documents
    pub reports_dir: PathBuf,

    /// Directory for generated chart files
    pub charts_dir: PathBuf,

    /// Model identifier sent to the provider
    pub model: String,

    /// Hard ceiling on orchestration loop round trips
    pub max_iterations: usize,

    /// Window size in days for the case growth metric
    pub growth_period_days: u32,

    /// Day window for the daily cases chart
    pub chart_days: u32,

    /// Month window for the monthly cases chart
    pub chart_months: u32,

    /// Cap on news items fetched for the report
    pub news_max_items: usize,

    /// News search API endpoint
    pub news_endpoint: String,
}

impl Default for SragConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/processed/srag.db"),
            reports_dir: PathBuf::from("reports"),
            charts_dir: PathBuf::from("reports/charts"),
            model: "llama-3.1-8b-instant".to_string(),
            max_iterations: 15,
            growth_period_days: 7,
            chart_days: 30,
            chart_months: 12,
            news_max_items: 3,
            news_endpoint: "https://api.gdeltproject.org/api/v2/doc/doc".to_string(),
        }
    }
}

impl SragConfig {
    /// Create a new configuration builder
    pub fn builder() -> SragConfigBuilder {
        SragConfigBuilder::default()
    }

    /// Apply environment overrides
    ///
    /// Reads `SRAG_DB_PATH`, `SRAG_REPORTS_DIR`, and `SRAG_MODEL` when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("SRAG_DB_PATH") {
            self.db_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("SRAG_REPORTS_DIR") {
            self.reports_dir = PathBuf::from(&dir);
            self.charts_dir = Path::new(&dir).join("charts");
        }
        if let Ok(model) = std::env::var("SRAG_MODEL") {
            self.model = model;
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(ReportError::Config(
                "max_iterations must be greater than 0".to_string(),
            ));
        }
        if self.growth_period_days == 0 {
            return Err(ReportError::Config(
                "growth_period_days must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// List every missing external prerequisite
    ///
    /// Used by the `verify` CLI mode. Reports all problems, not just the
    /// first one found.
    pub fn missing_prerequisites(&self) -> Vec<String> {
        let mut missing = Vec::new();

        if std::env::var("GROQ_API_KEY").is_err() {
            missing.push(
                "GROQ_API_KEY não configurada (defina no .env ou variável de ambiente)".to_string(),
            );
        }

        if !self.db_path.exists() {
            missing.push(format!(
                "banco de dados ausente: {} (execute o pré-processamento)",
                self.db_path.display()
            ));
        }

        missing
    }
}

/// Builder for SragConfig
#[derive(Debug, Default)]
pub struct SragConfigBuilder {
    db_path: Option<PathBuf>,
    reports_dir: Option<PathBuf>,
    charts_dir: Option<PathBuf>,
    model: Option<String>,
    max_iterations: Option<usize>,
    growth_period_days: Option<u32>,
    chart_days: Option<u32>,
    chart_months: Option<u32>,
    news_max_items: Option<usize>,
    news_endpoint: Option<String>,
}

impl SragConfigBuilder {
    /// Set the store path
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    /// Set the reports output directory
    pub fn reports_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reports_dir = Some(dir.into());
        self
    }

    /// Set the charts output directory
    pub fn charts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.charts_dir = Some(dir.into());
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the loop iteration ceiling
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Set the growth metric window in days
    pub fn growth_period_days(mut self, days: u32) -> Self {
        self.growth_period_days = Some(days);
        self
    }

    /// Set the news item cap
    pub fn news_max_items(mut self, max: usize) -> Self {
        self.news_max_items = Some(max);
        self
    }

    /// Set the news search endpoint
    pub fn news_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.news_endpoint = Some(endpoint.into());
        self
    }

    /// Build the configuration, falling back to defaults
    pub fn build(self) -> SragConfig {
        let defaults = SragConfig::default();
        SragConfig {
            db_path: self.db_path.unwrap_or(defaults.db_path),
            reports_dir: self.reports_dir.unwrap_or(defaults.reports_dir),
            charts_dir: self.charts_dir.unwrap_or(defaults.charts_dir),
            model: self.model.unwrap_or(defaults.model),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            growth_period_days: self
                .growth_period_days
                .unwrap_or(defaults.growth_period_days),
            chart_days: self.chart_days.unwrap_or(defaults.chart_days),
            chart_months: self.chart_months.unwrap_or(defaults.chart_months),
            news_max_items: self.news_max_items.unwrap_or(defaults.news_max_items),
            news_endpoint: self.news_endpoint.unwrap_or(defaults.news_endpoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SragConfig::default();
        assert_eq!(config.max_iterations, 15);
        assert_eq!(config.growth_period_days, 7);
        assert_eq!(config.chart_days, 30);
        assert_eq!(config.chart_months, 12);
        assert_eq!(config.news_max_items, 3);
        assert_eq!(config.model, "llama-3.1-8b-instant");
    }

    #[test]
    fn test_builder() {
        let config = SragConfig::builder()
            .db_path("/tmp/srag.db")
            .model("llama-3.3-70b-versatile")
            .max_iterations(5)
            .build();

        assert_eq!(config.db_path, PathBuf::from("/tmp/srag.db"));
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.max_iterations, 5);
        // Untouched fields keep defaults
        assert_eq!(config.news_max_items, 3);
    }

    #[test]
    fn test_validate_rejects_zero_iterations() {
        let config = SragConfig::builder().max_iterations(0).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_prerequisites_reports_absent_store() {
        let config = SragConfig::builder()
            .db_path("/definitely/not/here/srag.db")
            .build();
        let missing = config.missing_prerequisites();
        assert!(missing.iter().any(|m| m.contains("banco de dados ausente")));
    }
}

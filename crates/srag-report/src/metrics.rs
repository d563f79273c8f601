//! Metric engine for the SRAG report
//!
//! Four decision metrics computed from store aggregates. Every metric
//! carries its raw inputs alongside the derived value so the report can be
//! audited without re-running the queries.

use crate::error::{ReportError, Result};
use crate::store::StoreAccessor;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Severity band thresholds, in percent
///
/// Calibrated for SRAG surveillance reporting; band labels are the
/// Portuguese terms used in the generated report text.
pub mod bands {
    /// Mortality rate at or above this is "muito alta"
    pub const MORTALITY_VERY_HIGH: f64 = 10.0;
    /// Mortality rate at or above this is "alta"
    pub const MORTALITY_HIGH: f64 = 5.0;
    /// Mortality rate at or above this is "moderada"; below is "baixa"
    pub const MORTALITY_MODERATE: f64 = 2.0;

    /// ICU rate at or above this is "crítica"
    pub const ICU_CRITICAL: f64 = 30.0;
    /// ICU rate at or above this is "alta"
    pub const ICU_HIGH: f64 = 20.0;
    /// ICU rate at or above this is "moderada"; below is "baixa"
    pub const ICU_MODERATE: f64 = 10.0;

    /// Vaccination coverage at or above this is "boa"
    pub const VACCINATION_GOOD: f64 = 70.0;
    /// Vaccination coverage at or above this is "moderada"; below is "baixa"
    pub const VACCINATION_MODERATE: f64 = 50.0;

    /// Band label for a mortality rate
    pub fn mortality_severity(rate: f64) -> &'static str {
        if rate >= MORTALITY_VERY_HIGH {
            "muito alta"
        } else if rate >= MORTALITY_HIGH {
            "alta"
        } else if rate >= MORTALITY_MODERATE {
            "moderada"
        } else {
            "baixa"
        }
    }

    /// Band label for ICU occupancy pressure
    pub fn icu_pressure(rate: f64) -> &'static str {
        if rate >= ICU_CRITICAL {
            "crítica"
        } else if rate >= ICU_HIGH {
            "alta"
        } else if rate >= ICU_MODERATE {
            "moderada"
        } else {
            "baixa"
        }
    }

    /// Band label for vaccination coverage
    pub fn vaccination_coverage(rate: f64) -> &'static str {
        if rate >= VACCINATION_GOOD {
            "boa"
        } else if rate >= VACCINATION_MODERATE {
            "moderada"
        } else {
            "baixa"
        }
    }
}

/// Stable keys for the metric map, also used in the report template
pub const METRIC_CASE_GROWTH: &str = "taxa_aumento_casos";
pub const METRIC_MORTALITY: &str = "taxa_mortalidade";
pub const METRIC_ICU: &str = "taxa_ocupacao_uti";
pub const METRIC_VACCINATION: &str = "taxa_vacinacao";

/// One computed metric with its provenance
#[derive(Debug, Clone, Serialize)]
pub struct MetricResult {
    /// Human-readable metric name
    pub name: String,
    /// Derived value, rounded to two decimals
    pub value: f64,
    /// Unit of the value ("%" for all current metrics)
    pub unit: String,
    /// Portuguese interpretation including the severity band
    pub description: String,
    /// Raw counts the value was derived from
    pub raw_inputs: serde_json::Value,
    /// When the metric was computed
    pub computed_at: DateTime<Utc>,
}

impl MetricResult {
    fn new(
        name: &str,
        value: f64,
        description: String,
        raw_inputs: serde_json::Value,
    ) -> Self {
        Self {
            name: name.to_string(),
            value: round2(value),
            unit: "%".to_string(),
            description,
            raw_inputs,
            computed_at: Utc::now(),
        }
    }
}

/// Computes the four SRAG decision metrics from store aggregates
pub struct MetricsEngine {
    store: Arc<StoreAccessor>,
    growth_period_days: u32,
}

impl MetricsEngine {
    /// Create an engine over the given store
    pub fn new(store: Arc<StoreAccessor>, growth_period_days: u32) -> Self {
        Self {
            store,
            growth_period_days,
        }
    }

    /// Case growth rate between the two most recent windows of data
    ///
    /// Windows are anchored to the latest notification date in the store.
    /// A prior window of zero cases maps to 0% when the current window is
    /// also empty, and to 100% when cases appeared from nothing.
    pub fn case_growth_rate(&self) -> Result<MetricResult> {
        let window = self.store.case_growth_window(self.growth_period_days)?;

        let rate = if window.prior == 0 {
            if window.current == 0 { 0.0 } else { 100.0 }
        } else {
            (window.current - window.prior) as f64 / window.prior as f64 * 100.0
        };

        let reference = window
            .reference_date
            .clone()
            .unwrap_or_else(|| "sem dados".to_string());
        let description = if rate == 0.0 {
            format!("Casos estáveis em relação ao período anterior (ref: {reference})")
        } else {
            let direction = if rate > 0.0 { "Aumento" } else { "Redução" };
            format!(
                "{direction} de {:.1}% nos casos em relação ao período anterior (ref: {reference})",
                rate.abs()
            )
        };

        info!(rate = rate, "Taxa de aumento de casos calculada");
        Ok(MetricResult::new(
            "Taxa de Aumento de Casos",
            rate,
            description,
            json!({
                "casos_periodo_atual": window.current,
                "casos_periodo_anterior": window.prior,
                "periodo_dias": window.period_days,
                "data_referencia": window.reference_date,
            }),
        ))
    }

    /// Share of cases with a known outcome that ended in death
    ///
    /// Unknown outcomes are excluded from the denominator; an empty
    /// denominator yields 0%.
    pub fn mortality_rate(&self) -> Result<MetricResult> {
        let counts = self.store.death_counts()?;

        let rate = if counts.total_cases == 0 {
            0.0
        } else {
            counts.total_deaths as f64 / counts.total_cases as f64 * 100.0
        };

        let severity = bands::mortality_severity(rate);
        let description = format!(
            "Taxa de mortalidade {severity}: {rate:.2}% dos casos evoluíram para óbito"
        );

        info!(rate = rate, severity = severity, "Taxa de mortalidade calculada");
        Ok(MetricResult::new(
            "Taxa de Mortalidade",
            rate,
            description,
            json!({
                "total_casos": counts.total_cases,
                "total_obitos": counts.total_deaths,
                "obitos_srag": counts.srag_deaths,
                "obitos_outras_causas": counts.other_cause_deaths,
            }),
        ))
    }

    /// Share of hospitalized cases that went to the ICU
    pub fn icu_occupancy_rate(&self) -> Result<MetricResult> {
        let counts = self.store.icu_counts()?;

        let rate = if counts.total_hospitalized == 0 {
            0.0
        } else {
            counts.icu as f64 / counts.total_hospitalized as f64 * 100.0
        };

        let pressure = bands::icu_pressure(rate);
        let description = format!(
            "Pressão {pressure} sobre UTIs: {rate:.2}% das internações necessitaram de UTI"
        );

        info!(rate = rate, pressure = pressure, "Taxa de ocupação de UTI calculada");
        Ok(MetricResult::new(
            "Taxa de Ocupação de UTI",
            rate,
            description,
            json!({
                "total_internacoes": counts.total_hospitalized,
                "internacoes_uti": counts.icu,
                "nao_uti": counts.non_icu,
            }),
        ))
    }

    /// COVID vaccination coverage among cases with known vaccination status
    ///
    /// Rows with unknown status (code 9 or NULL) are excluded from the
    /// denominator; an empty denominator yields 0%.
    pub fn vaccination_rate(&self) -> Result<MetricResult> {
        let counts = self.store.vaccination_counts()?;
        let known_status = counts.covid_vaccinated + counts.covid_unvaccinated;

        let rate = if known_status == 0 {
            0.0
        } else {
            counts.covid_vaccinated as f64 / known_status as f64 * 100.0
        };

        let coverage = bands::vaccination_coverage(rate);
        let description = format!(
            "Cobertura vacinal {coverage}: {rate:.2}% dos casos com informação \
             estavam vacinados contra COVID-19"
        );

        info!(rate = rate, coverage = coverage, "Taxa de vacinação calculada");
        Ok(MetricResult::new(
            "Taxa de Vacinação",
            rate,
            description,
            json!({
                "total_casos": counts.total_cases,
                "total_com_info_vacina": known_status,
                "vacinados_covid": counts.covid_vaccinated,
                "nao_vacinados_covid": counts.covid_unvaccinated,
                "vacinados_gripe": counts.flu_vaccinated,
            }),
        ))
    }

    /// Compute every metric, isolating failures per key
    ///
    /// The map always carries exactly the four metric keys; a metric that
    /// failed holds its error so the caller can still report the others.
    pub fn calculate_all(&self) -> BTreeMap<String, Result<MetricResult>> {
        let mut results = BTreeMap::new();
        let metrics: [(&str, fn(&Self) -> Result<MetricResult>); 4] = [
            (METRIC_CASE_GROWTH, Self::case_growth_rate),
            (METRIC_MORTALITY, Self::mortality_rate),
            (METRIC_ICU, Self::icu_occupancy_rate),
            (METRIC_VACCINATION, Self::vaccination_rate),
        ];

        for (key, compute) in metrics {
            let result = compute(self);
            if let Err(err) = &result {
                warn!(metric = key, error = %err, "Falha ao calcular métrica");
            }
            results.insert(key.to_string(), result);
        }

        results
    }

    /// Formatted Portuguese summary of all metrics
    ///
    /// Failed metrics appear with their error message instead of a value.
    pub fn summary(&self) -> Result<String> {
        let results = self.calculate_all();
        if results.values().all(std::result::Result::is_err) {
            return Err(ReportError::NoData(
                "nenhuma métrica pôde ser calculada".to_string(),
            ));
        }

        let mut lines = vec!["=== MÉTRICAS SRAG ===".to_string()];
        for (key, result) in &results {
            match result {
                Ok(metric) => {
                    lines.push(format!(
                        "{}: {:.2}{}\n  {}",
                        metric.name, metric.value, metric.unit, metric.description
                    ));
                }
                Err(err) => {
                    lines.push(format!("{key}: erro ao calcular ({err})"));
                }
            }
        }
        Ok(lines.join("\n\n"))
    }
}

/// Round to two decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use srag_core::AuditLog;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn seed_store(rows: &[(&str, i64, i64, i64, i64, i64, &str)]) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("srag.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "CREATE TABLE srag (
                DT_NOTIFIC TEXT,
                EVOLUCAO INTEGER,
                HOSPITAL INTEGER,
                UTI INTEGER,
                VACINA_COV INTEGER,
                VACINA INTEGER,
                SG_UF_NOT TEXT
            )",
            [],
        )
        .unwrap();
        for row in rows {
            conn.execute(
                "INSERT INTO srag VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![row.0, row.1, row.2, row.3, row.4, row.5, row.6],
            )
            .unwrap();
        }
        (dir, path)
    }

    fn engine(path: &std::path::Path) -> MetricsEngine {
        let store = Arc::new(StoreAccessor::open(path, AuditLog::new()).unwrap());
        MetricsEngine::new(store, 7)
    }

    #[test]
    fn test_mortality_bands() {
        assert_eq!(bands::mortality_severity(12.0), "muito alta");
        assert_eq!(bands::mortality_severity(10.0), "muito alta");
        assert_eq!(bands::mortality_severity(7.5), "alta");
        assert_eq!(bands::mortality_severity(2.0), "moderada");
        assert_eq!(bands::mortality_severity(1.99), "baixa");
    }

    #[test]
    fn test_icu_bands() {
        assert_eq!(bands::icu_pressure(30.0), "crítica");
        assert_eq!(bands::icu_pressure(25.0), "alta");
        assert_eq!(bands::icu_pressure(10.0), "moderada");
        assert_eq!(bands::icu_pressure(9.9), "baixa");
    }

    #[test]
    fn test_vaccination_bands() {
        assert_eq!(bands::vaccination_coverage(70.0), "boa");
        assert_eq!(bands::vaccination_coverage(50.0), "moderada");
        assert_eq!(bands::vaccination_coverage(49.9), "baixa");
    }

    #[test]
    fn test_mortality_rate_excludes_unknown_outcomes() {
        // 4 rows with known outcome (2 deaths), 1 row with NULL outcome
        let (_dir, path) = seed_store(&[
            ("2024-01-01", 1, 1, 2, 1, 1, "SP"),
            ("2024-01-02", 1, 1, 2, 1, 1, "SP"),
            ("2024-01-03", 2, 1, 1, 2, 2, "RJ"),
            ("2024-01-04", 3, 1, 1, 2, 2, "RJ"),
        ]);
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO srag (DT_NOTIFIC, EVOLUCAO) VALUES ('2024-01-05', NULL)",
            [],
        )
        .unwrap();

        let metric = engine(&path).mortality_rate().unwrap();
        assert!((metric.value - 50.0).abs() < f64::EPSILON);
        assert!(metric.description.contains("alta"));
        assert_eq!(metric.raw_inputs["total_casos"], 4);
        assert_eq!(metric.raw_inputs["total_obitos"], 2);
    }

    #[test]
    fn test_zero_denominators_yield_zero() {
        let (_dir, path) = seed_store(&[]);
        let engine = engine(&path);

        assert!(engine.mortality_rate().unwrap().value.abs() < f64::EPSILON);
        assert!(engine.icu_occupancy_rate().unwrap().value.abs() < f64::EPSILON);
        assert!(engine.vaccination_rate().unwrap().value.abs() < f64::EPSILON);
        // No cases at all: growth is flat, not infinite
        assert!(engine.case_growth_rate().unwrap().value.abs() < f64::EPSILON);
    }

    #[test]
    fn test_growth_from_nothing_is_one_hundred_percent() {
        // All cases inside the latest 7-day window, none before
        let (_dir, path) = seed_store(&[
            ("2024-03-29", 1, 1, 2, 1, 1, "SP"),
            ("2024-03-30", 1, 1, 2, 1, 1, "SP"),
            ("2024-03-31", 1, 1, 2, 1, 1, "SP"),
        ]);

        let metric = engine(&path).case_growth_rate().unwrap();
        assert!((metric.value - 100.0).abs() < f64::EPSILON);
        assert!(metric.description.contains("Aumento"));
    }

    #[test]
    fn test_growth_decline_reads_as_reduction() {
        let mut rows = Vec::new();
        // prior window: 4 cases, current window: 2 cases
        for day in ["2024-03-19", "2024-03-20", "2024-03-21", "2024-03-22"] {
            rows.push((day, 1_i64, 1_i64, 2_i64, 1_i64, 1_i64, "SP"));
        }
        rows.push(("2024-03-30", 1, 1, 2, 1, 1, "SP"));
        rows.push(("2024-03-31", 1, 1, 2, 1, 1, "SP"));
        let (_dir, path) = seed_store(&rows);

        let metric = engine(&path).case_growth_rate().unwrap();
        assert!((metric.value - -50.0).abs() < f64::EPSILON);
        assert!(metric.description.contains("Redução"));
        assert!(metric.description.contains("2024-03-31"));
    }

    #[test]
    fn test_icu_rate_over_hospitalized_only() {
        let (_dir, path) = seed_store(&[
            ("2024-01-01", 1, 1, 1, 1, 1, "SP"), // hospitalized, ICU
            ("2024-01-02", 1, 1, 2, 1, 1, "SP"), // hospitalized, no ICU
            ("2024-01-03", 1, 2, 1, 1, 1, "SP"), // not hospitalized
        ]);

        let metric = engine(&path).icu_occupancy_rate().unwrap();
        assert!((metric.value - 50.0).abs() < f64::EPSILON);
        assert_eq!(metric.raw_inputs["total_internacoes"], 2);
    }

    #[test]
    fn test_vaccination_rate_excludes_unknown_status() {
        // 1 vaccinated, 1 unvaccinated, then unknown-status rows (9, NULL)
        // that must not enter the denominator
        let (_dir, path) = seed_store(&[
            ("2024-01-01", 1, 1, 2, 1, 1, "SP"),
            ("2024-01-02", 1, 1, 2, 2, 2, "RJ"),
            ("2024-01-03", 1, 1, 2, 9, 9, "SP"),
        ]);
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO srag (DT_NOTIFIC, VACINA_COV) VALUES ('2024-01-04', NULL)",
            [],
        )
        .unwrap();

        let metric = engine(&path).vaccination_rate().unwrap();
        assert!((metric.value - 50.0).abs() < f64::EPSILON);
        assert_eq!(metric.raw_inputs["total_casos"], 4);
        assert_eq!(metric.raw_inputs["total_com_info_vacina"], 2);
        assert_eq!(metric.raw_inputs["vacinados_covid"], 1);
        assert!(metric.description.contains("dos casos com informação"));
    }

    #[test]
    fn test_calculate_all_has_exactly_four_keys() {
        let (_dir, path) = seed_store(&[("2024-01-01", 1, 1, 2, 1, 1, "SP")]);
        let results = engine(&path).calculate_all();

        assert_eq!(results.len(), 4);
        for key in [
            METRIC_CASE_GROWTH,
            METRIC_MORTALITY,
            METRIC_ICU,
            METRIC_VACCINATION,
        ] {
            assert!(results.contains_key(key), "missing {key}");
            assert!(results[key].is_ok());
        }
    }

    #[test]
    fn test_summary_contains_all_metric_names() {
        let (_dir, path) = seed_store(&[
            ("2024-01-01", 2, 1, 1, 1, 1, "SP"),
            ("2024-01-02", 1, 1, 2, 2, 2, "RJ"),
        ]);

        let summary = engine(&path).summary().unwrap();
        assert!(summary.contains("MÉTRICAS SRAG"));
        assert!(summary.contains("Taxa de Mortalidade"));
        assert!(summary.contains("Taxa de Ocupação de UTI"));
        assert!(summary.contains("Taxa de Vacinação"));
        assert!(summary.contains("Taxa de Aumento de Casos"));
    }

    #[test]
    fn test_round2() {
        assert!((round2(33.333_333) - 33.33).abs() < f64::EPSILON);
        assert!((round2(66.666_666) - 66.67).abs() < f64::EPSILON);
    }
}

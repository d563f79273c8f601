//! Analytical store accessor
//!
//! All access to the processed `srag` table goes through `StoreAccessor`.
//! The accessor enforces a read-only query guard, records every call in the
//! audit log before returning, and opens a fresh read-only connection per
//! query (no held connections, no transactions).
//!
//! The guard is a textual heuristic, not a SQL parser. The only free text
//! that ever reaches `execute` is wrapped tool parameters, never the query
//! templates themselves; the denylist is defense in depth for a trusted
//! single-operator tool.

use crate::error::{ReportError, Result};
use rusqlite::{Connection, OpenFlags, types::ValueRef};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use srag_core::AuditLog;

/// Keywords that reject a statement outright (case-insensitive substring)
const BLOCKED_KEYWORDS: &[&str] = &[
    "DROP",
    "DELETE",
    "UPDATE",
    "INSERT",
    "ALTER",
    "CREATE",
    "TRUNCATE",
    "EXEC",
    "EXECUTE",
    "--",
    ";--",
    "/*",
    "*/",
    "UNION SELECT",
    "OR 1=1",
    "OR 1 = 1",
];

/// Audit detail cap; queries are truncated for log compactness
const AUDIT_QUERY_LIMIT: usize = 500;

/// Tabular query result: column names plus row-major values
#[derive(Debug, Clone)]
pub struct Table {
    /// Column names in select order
    pub columns: Vec<String>,
    /// Rows of JSON values, one entry per column
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// First-row integer accessor; NULL and missing columns read as 0
    ///
    /// SQLite aggregates like SUM return NULL over an empty set, which for
    /// every caller here means "zero observations".
    pub fn first_i64(&self, column: &str) -> i64 {
        self.column_index(column)
            .and_then(|i| self.rows.first().and_then(|r| r.get(i)))
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    /// First-row text accessor
    pub fn first_str(&self, column: &str) -> Option<String> {
        self.column_index(column)
            .and_then(|i| self.rows.first().and_then(|r| r.get(i)))
            .and_then(Value::as_str)
            .map(ToString::to_string)
    }
}

/// Death aggregate counts (rows with known outcome only)
#[derive(Debug, Clone, Copy)]
pub struct DeathCounts {
    pub total_cases: i64,
    pub total_deaths: i64,
    pub srag_deaths: i64,
    pub other_cause_deaths: i64,
}

/// ICU aggregate counts over hospitalized cases
#[derive(Debug, Clone, Copy)]
pub struct IcuCounts {
    pub total_hospitalized: i64,
    pub icu: i64,
    pub non_icu: i64,
}

/// Vaccination aggregate counts
#[derive(Debug, Clone, Copy)]
pub struct VaccinationCounts {
    pub total_cases: i64,
    pub covid_vaccinated: i64,
    pub covid_unvaccinated: i64,
    pub flu_vaccinated: i64,
}

/// Case counts for the growth metric windows
///
/// Both windows are referenced to the maximum notification date present in
/// the store, never to wall-clock "now".
#[derive(Debug, Clone)]
pub struct CaseGrowthWindow {
    pub current: i64,
    pub prior: i64,
    pub period_days: u32,
    pub reference_date: Option<String>,
}

/// General store statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct GeneralStatistics {
    pub total_records: i64,
    pub region_count: i64,
    pub first_notification: Option<String>,
    pub last_notification: Option<String>,
}

/// One bucket of a cases-over-time series
#[derive(Debug, Clone)]
pub struct CaseBucket {
    /// Day (`YYYY-MM-DD`) or month (`YYYY-MM`) label
    pub bucket: String,
    pub cases: i64,
}

/// Mediates all access to the processed SRAG record store
#[derive(Debug)]
pub struct StoreAccessor {
    db_path: PathBuf,
    audit: AuditLog,
}

impl StoreAccessor {
    /// Open an accessor over the store at `db_path`
    ///
    /// Fails with `StoreNotFound` if the file does not exist. No data means
    /// no meaningful operation, so this is fatal and not retried.
    pub fn open(db_path: impl Into<PathBuf>, audit: AuditLog) -> Result<Self> {
        let db_path = db_path.into();
        if !db_path.exists() {
            return Err(ReportError::StoreNotFound(db_path));
        }
        info!(db_path = %db_path.display(), "StoreAccessor aberto");
        Ok(Self { db_path, audit })
    }

    /// Path of the backing store
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Check a statement against the read-only guard
    fn validate_query(&self, sql: &str) -> Result<()> {
        let normalized = sql.trim().to_uppercase();

        if !normalized.starts_with("SELECT") {
            warn!(query = %truncate(sql, 50), "Query bloqueada - não é SELECT");
            return Err(ReportError::RejectedQuery(
                "apenas SELECT é aceito".to_string(),
            ));
        }

        for keyword in BLOCKED_KEYWORDS {
            if normalized.contains(keyword) {
                warn!(
                    keyword = %keyword,
                    query = %truncate(sql, 50),
                    "Query bloqueada - keyword perigosa"
                );
                return Err(ReportError::RejectedQuery(format!(
                    "contém termo bloqueado '{keyword}'"
                )));
            }
        }

        Ok(())
    }

    /// Execute a read-only statement and return its tabular result
    ///
    /// Rejected statements never touch the store. Every call, accepted or
    /// not, is written to the audit log before the result or error is
    /// returned.
    pub fn execute(&self, sql: &str) -> Result<Table> {
        if let Err(err) = self.validate_query(sql) {
            self.record_audit(sql, false, Some(&err.to_string()));
            return Err(err);
        }

        match self.run_query(sql) {
            Ok(table) => {
                self.record_audit(sql, true, None);
                info!(rows = table.len(), "Query executada com sucesso");
                Ok(table)
            }
            Err(err) => {
                self.record_audit(sql, false, Some(&err.to_string()));
                Err(err)
            }
        }
    }

    /// Open a fresh read-only connection, run the query, close it
    fn run_query(&self, sql: &str) -> Result<Table> {
        let conn = Connection::open_with_flags(&self.db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(ToString::to_string).collect();
        let column_count = columns.len();

        let mut rows_out = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut out = Vec::with_capacity(column_count);
            for i in 0..column_count {
                out.push(value_ref_to_json(row.get_ref(i)?));
            }
            rows_out.push(out);
        }

        Ok(Table {
            columns,
            rows: rows_out,
        })
    }

    fn record_audit(&self, sql: &str, success: bool, error: Option<&str>) {
        self.audit.record(
            "query_executada",
            json!({
                "query": truncate(sql, AUDIT_QUERY_LIMIT),
                "sucesso": success,
                "erro": error,
            }),
        );
    }

    /// Count records, optionally filtered
    ///
    /// The filter is caller-supplied free text wrapped by a tool, so the
    /// obvious statement separators are stripped before it is appended.
    pub fn count_records(&self, filter: Option<&str>) -> Result<i64> {
        let mut sql = "SELECT COUNT(*) as total FROM srag".to_string();
        if let Some(filter) = filter {
            let cleaned = filter.replace(';', "").replace("--", "");
            sql.push_str(&format!(" WHERE {cleaned}"));
        }
        let table = self.execute(&sql)?;
        Ok(table.first_i64("total"))
    }

    /// First and last notification dates in the store
    pub fn date_range(&self) -> Result<(Option<String>, Option<String>)> {
        let table = self.execute(
            "SELECT MIN(DT_NOTIFIC) as data_inicio, MAX(DT_NOTIFIC) as data_fim \
             FROM srag WHERE DT_NOTIFIC IS NOT NULL",
        )?;
        Ok((table.first_str("data_inicio"), table.first_str("data_fim")))
    }

    /// General statistics over the whole store
    pub fn general_statistics(&self) -> Result<GeneralStatistics> {
        let table = self.execute(
            "SELECT COUNT(*) as total_registros, \
                    COUNT(DISTINCT SG_UF_NOT) as total_estados, \
                    MIN(DT_NOTIFIC) as primeira_notificacao, \
                    MAX(DT_NOTIFIC) as ultima_notificacao \
             FROM srag",
        )?;

        Ok(GeneralStatistics {
            total_records: table.first_i64("total_registros"),
            region_count: table.first_i64("total_estados"),
            first_notification: table.first_str("primeira_notificacao"),
            last_notification: table.first_str("ultima_notificacao"),
        })
    }

    /// Death counts over rows with a known outcome code
    pub fn death_counts(&self) -> Result<DeathCounts> {
        let table = self.execute(
            "SELECT COUNT(*) as total_casos, \
                    SUM(CASE WHEN EVOLUCAO IN (2, 3) THEN 1 ELSE 0 END) as total_obitos, \
                    SUM(CASE WHEN EVOLUCAO = 2 THEN 1 ELSE 0 END) as obitos_srag, \
                    SUM(CASE WHEN EVOLUCAO = 3 THEN 1 ELSE 0 END) as obitos_outras_causas \
             FROM srag WHERE EVOLUCAO IS NOT NULL",
        )?;

        Ok(DeathCounts {
            total_cases: table.first_i64("total_casos"),
            total_deaths: table.first_i64("total_obitos"),
            srag_deaths: table.first_i64("obitos_srag"),
            other_cause_deaths: table.first_i64("obitos_outras_causas"),
        })
    }

    /// ICU counts over hospitalized cases
    pub fn icu_counts(&self) -> Result<IcuCounts> {
        let table = self.execute(
            "SELECT COUNT(*) as total_internacoes, \
                    SUM(CASE WHEN UTI = 1 THEN 1 ELSE 0 END) as internacoes_uti, \
                    SUM(CASE WHEN UTI = 2 THEN 1 ELSE 0 END) as nao_uti \
             FROM srag WHERE HOSPITAL = 1",
        )?;

        Ok(IcuCounts {
            total_hospitalized: table.first_i64("total_internacoes"),
            icu: table.first_i64("internacoes_uti"),
            non_icu: table.first_i64("nao_uti"),
        })
    }

    /// Vaccination counts over all cases
    pub fn vaccination_counts(&self) -> Result<VaccinationCounts> {
        let table = self.execute(
            "SELECT COUNT(*) as total_casos, \
                    SUM(CASE WHEN VACINA_COV = 1 THEN 1 ELSE 0 END) as vacinados_covid, \
                    SUM(CASE WHEN VACINA_COV = 2 THEN 1 ELSE 0 END) as nao_vacinados_covid, \
                    SUM(CASE WHEN VACINA = 1 THEN 1 ELSE 0 END) as vacinados_gripe \
             FROM srag",
        )?;

        Ok(VaccinationCounts {
            total_cases: table.first_i64("total_casos"),
            covid_vaccinated: table.first_i64("vacinados_covid"),
            covid_unvaccinated: table.first_i64("nao_vacinados_covid"),
            flu_vaccinated: table.first_i64("vacinados_gripe"),
        })
    }

    /// Case counts for the current and prior growth windows
    ///
    /// Referenced to MAX(DT_NOTIFIC), so stale datasets still produce a
    /// meaningful comparison.
    pub fn case_growth_window(&self, period_days: u32) -> Result<CaseGrowthWindow> {
        let double = period_days * 2;
        let sql = format!(
            "SELECT \
                SUM(CASE \
                    WHEN DATE(DT_NOTIFIC) >= DATE((SELECT MAX(DATE(DT_NOTIFIC)) FROM srag), '-{period_days} days') \
                    THEN 1 ELSE 0 \
                END) as casos_periodo_atual, \
                SUM(CASE \
                    WHEN DATE(DT_NOTIFIC) >= DATE((SELECT MAX(DATE(DT_NOTIFIC)) FROM srag), '-{double} days') \
                     AND DATE(DT_NOTIFIC) < DATE((SELECT MAX(DATE(DT_NOTIFIC)) FROM srag), '-{period_days} days') \
                    THEN 1 ELSE 0 \
                END) as casos_periodo_anterior, \
                (SELECT MAX(DATE(DT_NOTIFIC)) FROM srag) as data_referencia \
             FROM srag WHERE DT_NOTIFIC IS NOT NULL"
        );
        let table = self.execute(&sql)?;

        Ok(CaseGrowthWindow {
            current: table.first_i64("casos_periodo_atual"),
            prior: table.first_i64("casos_periodo_anterior"),
            period_days,
            reference_date: table.first_str("data_referencia"),
        })
    }

    /// Daily case counts over the last `days` days of available data
    pub fn daily_cases(&self, days: u32) -> Result<Vec<CaseBucket>> {
        let sql = format!(
            "SELECT DATE(DT_NOTIFIC) as data, COUNT(*) as total_casos \
             FROM srag \
             WHERE DT_NOTIFIC IS NOT NULL \
               AND DATE(DT_NOTIFIC) >= (SELECT DATE(MAX(DT_NOTIFIC), '-{days} days') FROM srag) \
             GROUP BY DATE(DT_NOTIFIC) \
             ORDER BY data"
        );
        self.case_series(&sql, "data")
    }

    /// Monthly case counts over the last `months` months of available data
    pub fn monthly_cases(&self, months: u32) -> Result<Vec<CaseBucket>> {
        let sql = format!(
            "SELECT strftime('%Y-%m', DT_NOTIFIC) as ano_mes, COUNT(*) as total_casos \
             FROM srag \
             WHERE DT_NOTIFIC IS NOT NULL \
               AND DT_NOTIFIC >= (SELECT DATE(MAX(DT_NOTIFIC), '-{months} months') FROM srag) \
             GROUP BY strftime('%Y-%m', DT_NOTIFIC) \
             ORDER BY ano_mes"
        );
        self.case_series(&sql, "ano_mes")
    }

    fn case_series(&self, sql: &str, bucket_column: &str) -> Result<Vec<CaseBucket>> {
        let table = self.execute(sql)?;
        let bucket_idx = table.column_index(bucket_column);
        let cases_idx = table.column_index("total_casos");

        let (Some(bucket_idx), Some(cases_idx)) = (bucket_idx, cases_idx) else {
            return Err(ReportError::NoData(format!(
                "colunas esperadas ausentes na série de casos ({bucket_column})"
            )));
        };

        Ok(table
            .rows
            .iter()
            .filter_map(|row| {
                let bucket = row.get(bucket_idx)?.as_str()?.to_string();
                let cases = row.get(cases_idx)?.as_i64().unwrap_or(0);
                Some(CaseBucket { bucket, cases })
            })
            .collect())
    }
}

fn value_ref_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(t) => Value::from(String::from_utf8_lossy(t).into_owned()),
        // No BLOB columns exist in the srag table
        ValueRef::Blob(_) => Value::Null,
    }
}

fn truncate(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Create a store with the srag schema and the given rows
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

    fn accessor(path: &Path) -> StoreAccessor {
        StoreAccessor::open(path, AuditLog::new()).unwrap()
    }

    #[test]
    fn test_open_missing_store_fails() {
        let err = StoreAccessor::open("/nonexistent/srag.db", AuditLog::new()).unwrap_err();
        assert!(matches!(err, ReportError::StoreNotFound(_)));
    }

    #[test]
    fn test_rejects_non_select() {
        let (_dir, path) = seed_store(&[]);
        let store = accessor(&path);

        for sql in ["DROP TABLE srag", "PRAGMA table_info(srag)", "VACUUM"] {
            let err = store.execute(sql).unwrap_err();
            assert!(matches!(err, ReportError::RejectedQuery(_)), "{sql}");
        }
    }

    #[test]
    fn test_rejects_denylisted_keywords_any_case() {
        let (_dir, path) = seed_store(&[]);
        let store = accessor(&path);

        let cases = [
            "SELECT * FROM srag; DROP TABLE srag",
            "select * from srag where x = 1 or 1=1",
            "SELECT * FROM srag UNION select senha FROM usuarios",
            "SELECT * FROM srag -- comentario",
            "select * from srag /* x */",
        ];
        for sql in cases {
            let err = store.execute(sql).unwrap_err();
            assert!(matches!(err, ReportError::RejectedQuery(_)), "{sql}");
        }
    }

    #[test]
    fn test_accepts_select_with_whitespace_and_case() {
        let (_dir, path) = seed_store(&[("2024-01-01", 1, 1, 2, 1, 1, "SP")]);
        let store = accessor(&path);

        let table = store.execute("   sElEcT COUNT(*) as total FROM srag  ").unwrap();
        assert_eq!(table.first_i64("total"), 1);
    }

    #[test]
    fn test_rejection_is_audited() {
        let (_dir, path) = seed_store(&[]);
        let audit = AuditLog::new();
        let store = StoreAccessor::open(&path, audit.clone()).unwrap();

        let _ = store.execute("DELETE FROM srag");

        let entries = audit.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "query_executada");
        assert_eq!(entries[0].details["sucesso"], false);
    }

    #[test]
    fn test_success_is_audited() {
        let (_dir, path) = seed_store(&[]);
        let audit = AuditLog::new();
        let store = StoreAccessor::open(&path, audit.clone()).unwrap();

        store.execute("SELECT COUNT(*) as total FROM srag").unwrap();

        let entries = audit.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details["sucesso"], true);
    }

    #[test]
    fn test_count_records_sanitizes_filter() {
        let (_dir, path) = seed_store(&[
            ("2024-01-01", 1, 1, 2, 1, 1, "SP"),
            ("2024-01-02", 2, 1, 1, 2, 2, "RJ"),
        ]);
        let store = accessor(&path);

        assert_eq!(store.count_records(None).unwrap(), 2);
        assert_eq!(store.count_records(Some("SG_UF_NOT = 'SP'")).unwrap(), 1);
        // Statement separators stripped out of the filter
        assert_eq!(
            store
                .count_records(Some("SG_UF_NOT = 'SP';"))
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_general_statistics() {
        let (_dir, path) = seed_store(&[
            ("2024-01-01", 1, 1, 2, 1, 1, "SP"),
            ("2024-02-01", 2, 1, 1, 2, 2, "RJ"),
            ("2024-03-01", 9, 2, 2, 1, 1, "SP"),
        ]);
        let store = accessor(&path);

        let stats = store.general_statistics().unwrap();
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.region_count, 2);
        assert_eq!(stats.first_notification.as_deref(), Some("2024-01-01"));
        assert_eq!(stats.last_notification.as_deref(), Some("2024-03-01"));
    }

    #[test]
    fn test_death_counts_ignore_unknown_outcome_nulls() {
        let (_dir, path) = seed_store(&[
            ("2024-01-01", 1, 1, 2, 1, 1, "SP"),
            ("2024-01-02", 2, 1, 1, 2, 2, "RJ"),
            ("2024-01-03", 3, 1, 2, 1, 1, "SP"),
        ]);
        let store = accessor(&path);

        let deaths = store.death_counts().unwrap();
        assert_eq!(deaths.total_cases, 3);
        assert_eq!(deaths.total_deaths, 2);
        assert_eq!(deaths.srag_deaths, 1);
        assert_eq!(deaths.other_cause_deaths, 1);
    }

    #[test]
    fn test_growth_window_referenced_to_max_date() {
        // Max date 2024-03-31. The current window starts at 03-24 inclusive
        // (>= max - 7 days) and the prior window covers 03-17 through 03-23.
        // Day 24 is left unseeded so each seeded window holds 7 rows.
        let mut rows = Vec::new();
        for day in 25..=31 {
            rows.push((format!("2024-03-{day:02}"), 1, 1, 2, 1, 1, "SP"));
        }
        for day in 17..=23 {
            rows.push((format!("2024-03-{day:02}"), 1, 1, 2, 1, 1, "SP"));
        }
        let borrowed: Vec<(&str, i64, i64, i64, i64, i64, &str)> = rows
            .iter()
            .map(|r| (r.0.as_str(), r.1, r.2, r.3, r.4, r.5, r.6))
            .collect();
        let (_dir, path) = seed_store(&borrowed);
        let store = accessor(&path);

        let window = store.case_growth_window(7).unwrap();
        assert_eq!(window.current, 7);
        assert_eq!(window.prior, 7);
        assert_eq!(window.reference_date.as_deref(), Some("2024-03-31"));
    }

    #[test]
    fn test_monthly_cases_grouping() {
        let (_dir, path) = seed_store(&[
            ("2024-01-10", 1, 1, 2, 1, 1, "SP"),
            ("2024-01-20", 1, 1, 2, 1, 1, "SP"),
            ("2024-02-05", 1, 1, 2, 1, 1, "SP"),
        ]);
        let store = accessor(&path);

        let series = store.monthly_cases(12).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].bucket, "2024-01");
        assert_eq!(series[0].cases, 2);
        assert_eq!(series[1].bucket, "2024-02");
        assert_eq!(series[1].cases, 1);
    }
}

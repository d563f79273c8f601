//! Chart generation for the SRAG report
//!
//! Charts are emitted as standalone SVG documents so the report stays
//! self-contained and needs no rendering toolchain. Two charts back the
//! report: daily cases over the last 30 days of data and monthly cases
//! over the last 12 months, both anchored to the newest notification date
//! in the store rather than the wall clock.

use crate::error::{ReportError, Result};
use crate::store::CaseBucket;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 70.0;

const LINE_COLOR: &str = "#1f77b4";
const BAR_COLOR: &str = "#2b8cbe";
const GRID_COLOR: &str = "#dddddd";
const TEXT_COLOR: &str = "#333333";

/// Writes SVG charts into the configured charts directory
pub struct ChartGenerator {
    charts_dir: PathBuf,
}

impl ChartGenerator {
    /// Create a generator targeting `charts_dir`
    pub fn new(charts_dir: impl Into<PathBuf>) -> Self {
        Self {
            charts_dir: charts_dir.into(),
        }
    }

    /// Directory the charts are written to
    pub fn charts_dir(&self) -> &Path {
        &self.charts_dir
    }

    /// Line chart of daily case counts
    ///
    /// Returns the path of the written SVG file.
    pub fn daily_cases_chart(&self, series: &[CaseBucket]) -> Result<PathBuf> {
        if series.is_empty() {
            return Err(ReportError::NoData(
                "nenhum caso diário disponível para o gráfico".to_string(),
            ));
        }

        let svg = render_line_chart(series, "Casos Diários de SRAG (últimos 30 dias de dados)");
        self.write_chart("casos_diarios.svg", &svg)
    }

    /// Bar chart of monthly case counts
    pub fn monthly_cases_chart(&self, series: &[CaseBucket]) -> Result<PathBuf> {
        if series.is_empty() {
            return Err(ReportError::NoData(
                "nenhum caso mensal disponível para o gráfico".to_string(),
            ));
        }

        let svg = render_bar_chart(series, "Casos Mensais de SRAG (últimos 12 meses de dados)");
        self.write_chart("casos_mensais.svg", &svg)
    }

    fn write_chart(&self, file_name: &str, svg: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.charts_dir)?;
        let path = self.charts_dir.join(file_name);
        std::fs::write(&path, svg)?;
        info!(path = %path.display(), "Gráfico gerado");
        Ok(path)
    }
}

struct PlotArea {
    x0: f64,
    y0: f64,
    width: f64,
    height: f64,
    max_value: f64,
}

impl PlotArea {
    fn new(series: &[CaseBucket]) -> Self {
        let max_value = series
            .iter()
            .map(|b| b.cases)
            .max()
            .unwrap_or(0)
            .max(1) as f64;
        Self {
            x0: MARGIN_LEFT,
            y0: MARGIN_TOP,
            width: WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
            height: HEIGHT - MARGIN_TOP - MARGIN_BOTTOM,
            max_value,
        }
    }

    fn y_for(&self, cases: i64) -> f64 {
        let ratio = cases as f64 / self.max_value;
        self.y0 + self.height * (1.0 - ratio)
    }
}

fn render_line_chart(series: &[CaseBucket], title: &str) -> String {
    let area = PlotArea::new(series);
    let mut svg = svg_header(title, &area);

    let step = if series.len() > 1 {
        area.width / (series.len() - 1) as f64
    } else {
        0.0
    };

    let mut points = String::new();
    for (i, bucket) in series.iter().enumerate() {
        let x = area.x0 + step * i as f64;
        let y = area.y_for(bucket.cases);
        let _ = write!(points, "{x:.1},{y:.1} ");
    }
    let _ = writeln!(
        svg,
        r#"  <polyline points="{}" fill="none" stroke="{LINE_COLOR}" stroke-width="2"/>"#,
        points.trim_end()
    );

    // Label roughly every fifth day to keep the axis readable
    let label_every = (series.len() / 6).max(1);
    for (i, bucket) in series.iter().enumerate() {
        if i % label_every != 0 && i != series.len() - 1 {
            continue;
        }
        let x = area.x0 + step * i as f64;
        let _ = writeln!(
            svg,
            r#"  <text x="{x:.1}" y="{y:.1}" font-size="11" fill="{TEXT_COLOR}" text-anchor="middle">{label}</text>"#,
            y = area.y0 + area.height + 20.0,
            label = escape_text(&bucket.bucket),
        );
    }

    svg.push_str("</svg>\n");
    svg
}

fn render_bar_chart(series: &[CaseBucket], title: &str) -> String {
    let area = PlotArea::new(series);
    let mut svg = svg_header(title, &area);

    let slot = area.width / series.len() as f64;
    let bar_width = slot * 0.7;

    for (i, bucket) in series.iter().enumerate() {
        let x = area.x0 + slot * i as f64 + (slot - bar_width) / 2.0;
        let y = area.y_for(bucket.cases);
        let bar_height = area.y0 + area.height - y;
        let _ = writeln!(
            svg,
            r#"  <rect x="{x:.1}" y="{y:.1}" width="{bar_width:.1}" height="{bar_height:.1}" fill="{BAR_COLOR}"/>"#,
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{cx:.1}" y="{ly:.1}" font-size="11" fill="{TEXT_COLOR}" text-anchor="middle">{label}</text>"#,
            cx = x + bar_width / 2.0,
            ly = area.y0 + area.height + 20.0,
            label = escape_text(&bucket.bucket),
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{cx:.1}" y="{vy:.1}" font-size="11" fill="{TEXT_COLOR}" text-anchor="middle">{cases}</text>"#,
            cx = x + bar_width / 2.0,
            vy = y - 6.0,
            cases = bucket.cases,
        );
    }

    svg.push_str("</svg>\n");
    svg
}

fn svg_header(title: &str, area: &PlotArea) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    );
    let _ = writeln!(
        svg,
        r##"  <rect width="{WIDTH}" height="{HEIGHT}" fill="#ffffff"/>"##
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{cx:.1}" y="28" font-size="16" font-weight="bold" fill="{TEXT_COLOR}" text-anchor="middle">{title}</text>"#,
        cx = WIDTH / 2.0,
        title = escape_text(title),
    );

    // Horizontal gridlines with value labels at quarters of the max
    for i in 0..=4 {
        let ratio = f64::from(i) / 4.0;
        let y = area.y0 + area.height * (1.0 - ratio);
        let value = (area.max_value * ratio).round();
        let _ = writeln!(
            svg,
            r#"  <line x1="{x0:.1}" y1="{y:.1}" x2="{x1:.1}" y2="{y:.1}" stroke="{GRID_COLOR}" stroke-width="1"/>"#,
            x0 = area.x0,
            x1 = area.x0 + area.width,
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{x:.1}" y="{ty:.1}" font-size="11" fill="{TEXT_COLOR}" text-anchor="end">{value:.0}</text>"#,
            x = area.x0 - 8.0,
            ty = y + 4.0,
        );
    }

    // Axes
    let _ = writeln!(
        svg,
        r#"  <line x1="{x0:.1}" y1="{y0:.1}" x2="{x0:.1}" y2="{y1:.1}" stroke="{TEXT_COLOR}" stroke-width="1"/>"#,
        x0 = area.x0,
        y0 = area.y0,
        y1 = area.y0 + area.height,
    );
    let _ = writeln!(
        svg,
        r#"  <line x1="{x0:.1}" y1="{y1:.1}" x2="{x1:.1}" y2="{y1:.1}" stroke="{TEXT_COLOR}" stroke-width="1"/>"#,
        x0 = area.x0,
        x1 = area.x0 + area.width,
        y1 = area.y0 + area.height,
    );

    svg
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_series(n: usize) -> Vec<CaseBucket> {
        (0..n)
            .map(|i| CaseBucket {
                bucket: format!("2024-03-{:02}", i + 1),
                cases: (i as i64 % 7) * 3 + 1,
            })
            .collect()
    }

    #[test]
    fn test_daily_chart_written_to_disk() {
        let dir = TempDir::new().unwrap();
        let generator = ChartGenerator::new(dir.path());

        let path = generator.daily_cases_chart(&sample_series(30)).unwrap();
        assert!(path.exists());
        assert_eq!(path.file_name().unwrap(), "casos_diarios.svg");

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("polyline"));
        assert!(svg.contains("Casos Diários"));
    }

    #[test]
    fn test_monthly_chart_has_one_bar_per_bucket() {
        let dir = TempDir::new().unwrap();
        let generator = ChartGenerator::new(dir.path());
        let series = vec![
            CaseBucket {
                bucket: "2024-01".to_string(),
                cases: 10,
            },
            CaseBucket {
                bucket: "2024-02".to_string(),
                cases: 25,
            },
            CaseBucket {
                bucket: "2024-03".to_string(),
                cases: 5,
            },
        ];

        let path = generator.monthly_cases_chart(&series).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert_eq!(svg.matches("<rect x=").count(), 3);
        assert!(svg.contains("2024-02"));
    }

    #[test]
    fn test_empty_series_is_an_error() {
        let dir = TempDir::new().unwrap();
        let generator = ChartGenerator::new(dir.path());

        assert!(matches!(
            generator.daily_cases_chart(&[]),
            Err(ReportError::NoData(_))
        ));
        assert!(matches!(
            generator.monthly_cases_chart(&[]),
            Err(ReportError::NoData(_))
        ));
    }

    #[test]
    fn test_creates_missing_charts_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("reports").join("charts");
        let generator = ChartGenerator::new(&nested);

        generator.daily_cases_chart(&sample_series(5)).unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn test_single_point_series_renders() {
        let dir = TempDir::new().unwrap();
        let generator = ChartGenerator::new(dir.path());

        let path = generator.daily_cases_chart(&sample_series(1)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_title_is_escaped() {
        let svg = render_line_chart(&sample_series(2), "a < b & c");
        assert!(svg.contains("a &lt; b &amp; c"));
    }
}

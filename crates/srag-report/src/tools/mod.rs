//! The five tools exposed to the orchestration loop
//!
//! Each tool wraps one collaborator. Tool names and descriptions are in
//! Portuguese because they are part of the prompt surface the model sees.
//!
//! Tools absorb collaborator failures: a failing metric engine or news
//! client produces a descriptive Portuguese failure string as the tool's
//! successful payload, so the loop keeps running and the model can react.

mod charts;
mod metrics;
mod news;
mod report;
mod statistics;

pub use charts::GenerateChartsTool;
pub use metrics::CalculateMetricsTool;
pub use news::FetchNewsTool;
pub use report::GenerateReportTool;
pub use statistics::QueryStatisticsTool;

use crate::charts::ChartGenerator;
use crate::config::SragConfig;
use crate::metrics::MetricsEngine;
use crate::news::NewsClient;
use crate::store::StoreAccessor;
use srag_tools::ToolRegistry;
use std::sync::Arc;

/// Build the full registry of SRAG tools over one shared store accessor
pub fn build_registry(config: &SragConfig, store: Arc<StoreAccessor>) -> crate::Result<ToolRegistry> {
    let engine = Arc::new(MetricsEngine::new(
        Arc::clone(&store),
        config.growth_period_days,
    ));
    let news = Arc::new(NewsClient::new(
        config.news_endpoint.clone(),
        config.news_max_items,
    ));

    let registry = ToolRegistry::new();
    registry.register(Arc::new(CalculateMetricsTool::new(Arc::clone(&engine))));
    registry.register(Arc::new(GenerateChartsTool::new(
        Arc::clone(&store),
        ChartGenerator::new(config.charts_dir.clone()),
        config.chart_days,
        config.chart_months,
    )));
    registry.register(Arc::new(FetchNewsTool::new(Arc::clone(&news))));
    registry.register(Arc::new(QueryStatisticsTool::new(Arc::clone(&store))));
    registry.register(Arc::new(GenerateReportTool::new(
        Arc::clone(&store),
        engine,
        news,
        config,
    )?));

    Ok(registry)
}

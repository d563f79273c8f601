//! SRAG surveillance domain for the report agent
//!
//! This crate holds everything that knows about the SRAG dataset: the
//! analytical store accessor with its query guard, the metric engine, the
//! chart generator, the news client, the report assembler, and the five
//! `Tool` implementations the orchestration loop dispatches.

pub mod charts;
pub mod config;
pub mod document;
pub mod error;
pub mod metrics;
pub mod news;
pub mod store;
pub mod tools;

pub use charts::ChartGenerator;
pub use config::SragConfig;
pub use document::{ReportAssembler, ReportInputs};
pub use error::{ReportError, Result};
pub use metrics::{MetricResult, MetricsEngine};
pub use news::{NewsClient, NewsItem};
pub use store::{StoreAccessor, Table};
pub use tools::build_registry;

//! Seller Insights Library
//!
//! Turns loosely structured marketplace exports (sales, inventory, advertising,
//! reviews) into summary metrics, threshold alerts, and a dashboard report.
//!
//! # Overview
//!
//! - **Discovery**: CSV files are bucketed by domain from their file names
//! - **Loading**: column names are normalized and numeric/date columns coerced
//! - **Column Resolution**: ordered per-domain rule tables decide which column
//!   holds revenue, stock level, days of supply, and so on
//! - **Analysis**: one analyzer per domain produces a metrics record and alerts
//! - **KPIs**: a flat headline summary across all analyzed domains
//! - **Reporting**: a timestamped JSON dashboard with raw table copies
//!
//! Every derived metric is optional. A missing or malformed column removes
//! the metrics that depend on it; a broken file removes only its domain. The
//! run fails only when no domain could be loaded at all.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use seller_insights::{AnalyticsConfig, Pipeline};
//!
//! let config = AnalyticsConfig::builder()
//!     .input_dir("exports")
//!     .output_dir("output")
//!     .build()?;
//!
//! let outcome = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//!
//! for alert in &outcome.alerts {
//!     println!("[{}] {}: {}", alert.level, alert.title, alert.message);
//! }
//! ```
//!
//! # Working With Single Tables
//!
//! ```rust,ignore
//! use seller_insights::{Analyzer, Domain, Thresholds, TableLoader};
//!
//! let table = TableLoader::load("inventory.csv".as_ref(), Domain::Inventory)?;
//! let mut metrics = Default::default();
//! let alerts = Analyzer::new(Thresholds::default()).analyze_table(&table, &mut metrics)?;
//! ```

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod error;
pub mod kpi;
pub mod loader;
pub mod pipeline;
pub mod reporting;
pub mod resolver;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use analysis::{AnalysisResult, Analyzer};
pub use config::{AnalyticsConfig, AnalyticsConfigBuilder, ConfigValidationError, Thresholds};
pub use discovery::{DiscoveredFiles, FileClassifier, classify};
pub use error::{InsightsError, Result as InsightsResult, ResultExt};
pub use kpi::summarize;
pub use loader::TableLoader;
pub use pipeline::{
    ClosureProgressReporter, DomainFailure, Insights, Pipeline, PipelineBuilder, PipelineStage,
    ProgressReporter, ProgressUpdate, RunOutcome,
};
pub use reporting::{ReportGenerator, SellerReport};
pub use resolver::{ResolvedColumns, resolve, resolve_for, role_of};
pub use types::{
    AdvertisingMetrics, Alert, AlertLevel, CampaignPerformance, CleanedTable, ColumnRole, Domain,
    DomainMetrics, DomainTables, InventoryMetrics, KpiSummary, LoadStats, MonthlyRevenue,
    ParseWarning, ProductPerformance, ReviewMetrics, SalesMetrics,
};
pub use utils::{normalize_column_name, parse_datetime_string, parse_numeric_string};

//! Configuration types for the analytics pipeline.
//!
//! Business thresholds live in [`Thresholds`] so every alert boundary stays
//! adjustable. Use [`AnalyticsConfig::builder()`] for a validated configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{InsightsError, Result};

/// Longest accepted recent-sales window, about a century.
pub const MAX_RECENT_WINDOW_DAYS: i64 = 36_500;

/// Business thresholds used by the domain analyzers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Rows with fewer days of supply than this are low stock.
    /// Default: 7
    pub low_stock_days: f64,

    /// Low-stock rows below this are a critical shortage.
    /// Default: 3
    pub critical_stock_days: f64,

    /// Rows with more days of supply than this are overstock.
    /// Default: 30
    pub overstock_days: f64,

    /// Advertising cost of sale, in percent, above which a campaign underperforms.
    /// Default: 40
    pub high_acos: f64,

    /// Reviews rated strictly below this are low rated.
    /// Default: 3.0
    pub low_rating: f64,

    /// Month-over-month growth, in percent, below which sales are declining.
    /// Default: -10
    pub sales_decline_pct: f64,

    /// Window for recent transaction metrics.
    /// Default: 30
    pub recent_window_days: i64,

    /// Number of products kept in the revenue ranking.
    /// Default: 10
    pub top_products_limit: usize,

    /// Number of low-stock / overstock rows kept for display.
    /// Default: 10
    pub stock_preview_limit: usize,

    /// Number of campaigns kept in the spend ranking.
    /// Default: 10
    pub campaign_preview_limit: usize,

    /// Number of underperforming campaigns listed in the alert.
    /// Default: 5
    pub high_acos_listing_limit: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_stock_days: 7.0,
            critical_stock_days: 3.0,
            overstock_days: 30.0,
            high_acos: 40.0,
            low_rating: 3.0,
            sales_decline_pct: -10.0,
            recent_window_days: 30,
            top_products_limit: 10,
            stock_preview_limit: 10,
            campaign_preview_limit: 10,
            high_acos_listing_limit: 5,
        }
    }
}

impl Thresholds {
    /// Minimum return on ad spend implied by the ACOS ceiling (`100 / high_acos`).
    pub fn min_roas(&self) -> f64 {
        100.0 / self.high_acos
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.critical_stock_days < 0.0 || self.critical_stock_days > self.low_stock_days {
            return Err(ConfigValidationError::InvalidStockWindow {
                field: "critical_stock_days".to_string(),
                value: self.critical_stock_days,
            });
        }

        if self.low_stock_days > self.overstock_days {
            return Err(ConfigValidationError::InvalidStockWindow {
                field: "low_stock_days".to_string(),
                value: self.low_stock_days,
            });
        }

        if self.high_acos.is_nan() || self.high_acos <= 0.0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "high_acos".to_string(),
                value: self.high_acos,
            });
        }

        if !(0.0..=5.0).contains(&self.low_rating) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "low_rating".to_string(),
                value: self.low_rating,
            });
        }

        if !(1..=MAX_RECENT_WINDOW_DAYS).contains(&self.recent_window_days) {
            return Err(ConfigValidationError::InvalidWindow(self.recent_window_days));
        }

        Ok(())
    }
}

/// Configuration for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Directory scanned for CSV exports.
    /// Default: "."
    pub input_dir: PathBuf,

    /// Directory the report artifact is written to.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Directory for per-run log files.
    /// Default: "logs"
    pub log_dir: PathBuf,

    /// Whether to write the report artifact to disk.
    /// Default: true
    pub write_report: bool,

    pub thresholds: Thresholds,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("output"),
            log_dir: PathBuf::from("logs"),
            write_report: true,
            thresholds: Thresholds::default(),
        }
    }
}

impl AnalyticsConfig {
    pub fn builder() -> AnalyticsConfigBuilder {
        AnalyticsConfigBuilder::default()
    }

    /// Read a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: AnalyticsConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| InsightsError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        self.thresholds.validate()
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value}")]
    InvalidThreshold { field: String, value: f64 },

    #[error(
        "Invalid stock window for '{field}': {value} (need 0 <= critical <= low <= overstock)"
    )]
    InvalidStockWindow { field: String, value: f64 },

    #[error("Invalid recent window: {0} days (must be between 1 and 36500)")]
    InvalidWindow(i64),
}

impl From<ConfigValidationError> for InsightsError {
    fn from(e: ConfigValidationError) -> Self {
        InsightsError::InvalidConfig(e.to_string())
    }
}

/// Builder for [`AnalyticsConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalyticsConfigBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    write_report: Option<bool>,
    thresholds: Option<Thresholds>,
}

impl AnalyticsConfigBuilder {
    pub fn input_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(path.into());
        self
    }

    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    pub fn log_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(path.into());
        self
    }

    /// Enable or disable writing the report artifact.
    ///
    /// When false, results are kept in memory only.
    pub fn write_report(mut self, write: bool) -> Self {
        self.write_report = Some(write);
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalyticsConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<AnalyticsConfig, ConfigValidationError> {
        let defaults = AnalyticsConfig::default();
        let config = AnalyticsConfig {
            input_dir: self.input_dir.unwrap_or(defaults.input_dir),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            log_dir: self.log_dir.unwrap_or(defaults.log_dir),
            write_report: self.write_report.unwrap_or(true),
            thresholds: self.thresholds.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

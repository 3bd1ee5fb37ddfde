//! Domain analyzers.
//!
//! Each analyzer consumes one cleaned table and returns its metrics record
//! together with the alerts it raised. [`Analyzer::analyze_all`] runs them in
//! domain order and isolates failures: a domain whose analysis fails is left
//! out of the results and the run continues.

pub mod advertising;
pub mod inventory;
pub mod reviews;
pub mod sales;

use chrono::{Local, NaiveDateTime};
use tracing::{error, info};

use crate::config::Thresholds;
use crate::error::{InsightsError, Result};
use crate::types::{Alert, CleanedTable, Domain, DomainMetrics, DomainTables};

/// Metrics and alerts of one analysis pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    pub metrics: DomainMetrics,
    /// In domain order, then in the order each analyzer raised them.
    pub alerts: Vec<Alert>,
    /// Domains whose analysis failed, with the error that stopped them.
    pub failed: Vec<(Domain, String)>,
}

/// Runs the domain analyzers against a fixed set of thresholds.
#[derive(Debug, Clone)]
pub struct Analyzer {
    thresholds: Thresholds,
    now: Option<NaiveDateTime>,
}

impl Analyzer {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            now: None,
        }
    }

    /// Pin the reference time for the recent-sales window.
    ///
    /// Without it the window is measured from the local wall clock at analysis time.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Analyze every table present, in domain order.
    pub fn analyze_all(&self, tables: &DomainTables) -> AnalysisResult {
        info!("Starting analysis of {} tables", tables.len());

        let mut result = AnalysisResult::default();
        for table in tables.iter() {
            match self.analyze_table(table, &mut result.metrics) {
                Ok(alerts) => result.alerts.extend(alerts),
                Err(e) => {
                    error!("{}", e);
                    result.failed.push((table.domain, e.to_string()));
                }
            }
        }

        info!("Generated {} alerts", result.alerts.len());
        result
    }

    /// Analyze one table, storing its metrics in `metrics` on success.
    pub fn analyze_table(&self, table: &CleanedTable, metrics: &mut DomainMetrics) -> Result<Vec<Alert>> {
        let domain = table.domain;
        let wrap = |e: InsightsError| InsightsError::analysis(domain, e);

        let alerts = match domain {
            Domain::Sales => {
                let now = self.now.unwrap_or_else(|| Local::now().naive_local());
                let (m, alerts) = sales::analyze(table, &self.thresholds, now).map_err(wrap)?;
                metrics.sales = Some(m);
                alerts
            }
            Domain::Inventory => {
                let (m, alerts) = inventory::analyze(table, &self.thresholds).map_err(wrap)?;
                metrics.inventory = Some(m);
                alerts
            }
            Domain::Advertising => {
                let (m, alerts) = advertising::analyze(table, &self.thresholds).map_err(wrap)?;
                metrics.advertising = Some(m);
                alerts
            }
            Domain::Reviews => {
                let (m, alerts) = reviews::analyze(table, &self.thresholds).map_err(wrap)?;
                metrics.reviews = Some(m);
                alerts
            }
        };

        Ok(alerts)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

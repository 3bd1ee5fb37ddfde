use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::{
    Alert, AlertLevel, Domain, DomainMetrics, DomainTables, KpiSummary, LoadStats, TableRows,
};
use crate::utils::frame_to_rows;

// ============================================================================
// Report Types
// ============================================================================

/// The dashboard artifact written once per run.
///
/// Sections mirror the workbook layout a spreadsheet renderer would produce:
/// a dashboard, one section per analyzed domain, the alert list, and a raw
/// copy of each loaded table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerReport {
    /// Local time the report was built, `YYYY-mm-dd HH:MM:SS`.
    pub generated_at: String,
    pub dashboard: Dashboard,
    /// Present domains only, in domain order.
    pub sections: Vec<DomainSection>,
    pub alerts: AlertsSection,
    pub raw_data: Vec<RawSheet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub title: String,
    pub kpis: KpiSummary,
    pub alert_counts: AlertCounts,
    pub data_sources: Vec<LoadStats>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCounts {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

impl AlertCounts {
    pub fn tally(alerts: &[Alert]) -> Self {
        let mut counts = Self::default();
        for alert in alerts {
            match alert.level {
                AlertLevel::Critical => counts.critical += 1,
                AlertLevel::Warning => counts.warning += 1,
                AlertLevel::Info => counts.info += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSection {
    pub domain: Domain,
    pub title: String,
    /// The domain's metrics record as written by the analyzer.
    pub metrics: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsSection {
    pub title: String,
    pub items: Vec<Alert>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSheet {
    pub domain: Domain,
    pub title: String,
    pub source: String,
    pub rows: TableRows,
}

// ============================================================================
// Generator
// ============================================================================

/// Builds and writes [`SellerReport`]s.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Assemble the report from one run's results.
    pub fn build_report(
        tables: &DomainTables,
        metrics: &DomainMetrics,
        alerts: &[Alert],
        kpis: &KpiSummary,
    ) -> Result<SellerReport> {
        let mut sections = Vec::new();
        for domain in Domain::ALL {
            let value = match domain {
                Domain::Sales => metrics.sales.as_ref().map(serde_json::to_value),
                Domain::Inventory => metrics.inventory.as_ref().map(serde_json::to_value),
                Domain::Advertising => metrics.advertising.as_ref().map(serde_json::to_value),
                Domain::Reviews => metrics.reviews.as_ref().map(serde_json::to_value),
            };
            if let Some(value) = value {
                sections.push(DomainSection {
                    domain,
                    title: domain.section_title().to_string(),
                    metrics: value.with_context(|| format!("Failed to serialize {} metrics", domain))?,
                });
            }
        }

        let mut raw_data = Vec::with_capacity(tables.len());
        for table in tables.iter() {
            raw_data.push(RawSheet {
                domain: table.domain,
                title: format!("Raw {}", capitalize(table.domain.as_str())),
                source: table.stats.source.clone(),
                rows: frame_to_rows(&table.frame, None)
                    .with_context(|| format!("Failed to copy {} table", table.domain))?,
            });
        }

        Ok(SellerReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            dashboard: Dashboard {
                title: "Executive Dashboard".to_string(),
                kpis: kpis.clone(),
                alert_counts: AlertCounts::tally(alerts),
                data_sources: tables.iter().map(|t| t.stats.clone()).collect(),
            },
            sections,
            alerts: AlertsSection {
                title: "Actionable Alerts".to_string(),
                items: alerts.to_vec(),
            },
            raw_data,
        })
    }

    /// Write `report` as `seller_dashboard_<timestamp>.json` in the output directory.
    pub fn write_report(&self, report: &SellerReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })?;

        let file_name = format!(
            "seller_dashboard_{}.json",
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let report_path = self.output_dir.join(file_name);

        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::TableLoader;
    use crate::types::ReviewMetrics;
    use polars::prelude::*;

    fn sample() -> (DomainTables, DomainMetrics, Vec<Alert>) {
        let df = df!("Rating" => &["1", "5"]).unwrap();
        let tables: DomainTables = [TableLoader::clean(df, Domain::Reviews, "reviews.csv").unwrap()]
            .into_iter()
            .collect();
        let metrics = DomainMetrics {
            reviews: Some(ReviewMetrics {
                total_reviews: 2,
                avg_rating: Some(3.0),
                low_rated_count: Some(1),
            }),
            ..Default::default()
        };
        let alerts = vec![Alert::new(
            Domain::Reviews,
            AlertLevel::Warning,
            "Low Ratings Alert",
            "1 reviews have rating < 3",
        )];
        (tables, metrics, alerts)
    }

    #[test]
    fn test_build_report_sections() {
        let (tables, metrics, alerts) = sample();
        let report =
            ReportGenerator::build_report(&tables, &metrics, &alerts, &KpiSummary::default()).unwrap();

        assert_eq!(report.dashboard.title, "Executive Dashboard");
        assert_eq!(report.dashboard.alert_counts.warning, 1);
        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].title, "Customer Reviews");
        assert_eq!(report.sections[0].metrics["low_rated_count"], 1);
        assert_eq!(report.alerts.title, "Actionable Alerts");
        assert_eq!(report.raw_data[0].title, "Raw Reviews");
        assert_eq!(report.raw_data[0].rows.len(), 2);
    }

    #[test]
    fn test_write_report_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let (tables, metrics, alerts) = sample();
        let report =
            ReportGenerator::build_report(&tables, &metrics, &alerts, &KpiSummary::default()).unwrap();

        let generator = ReportGenerator::new(dir.path().join("nested"));
        let path = generator.write_report(&report).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("seller_dashboard_"));
        assert!(name.ends_with(".json"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["alerts"]["items"][0]["type"], "reviews");
    }

    #[test]
    fn test_alert_counts() {
        let alerts = vec![
            Alert::new(Domain::Inventory, AlertLevel::Critical, "a", "b"),
            Alert::new(Domain::Inventory, AlertLevel::Warning, "a", "b"),
            Alert::new(Domain::Inventory, AlertLevel::Info, "a", "b"),
            Alert::new(Domain::Sales, AlertLevel::Warning, "a", "b"),
        ];
        assert_eq!(
            AlertCounts::tally(&alerts),
            AlertCounts { critical: 1, warning: 2, info: 1 }
        );
    }
}

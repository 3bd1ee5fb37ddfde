//! Shared data types for the analytics pipeline.
//!
//! Metrics records use `Option` for every derived value whose inputs may be
//! missing. Absent values are skipped during serialization, so a metric that
//! could not be computed has no key at all rather than a `0`, `NaN` or
//! `Infinity` placeholder.

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Domains and column roles
// ============================================================================

/// Business data category a file or table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Sales,
    Inventory,
    Advertising,
    Reviews,
}

impl Domain {
    /// All domains in invocation order. Alerts are accumulated in this order.
    pub const ALL: [Domain; 4] = [
        Domain::Sales,
        Domain::Inventory,
        Domain::Advertising,
        Domain::Reviews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Inventory => "inventory",
            Self::Advertising => "advertising",
            Self::Reviews => "reviews",
        }
    }

    /// Section title used in the generated report.
    pub fn section_title(&self) -> &'static str {
        match self {
            Self::Sales => "Sales Analysis",
            Self::Inventory => "Inventory Health",
            Self::Advertising => "Advertising ROI",
            Self::Reviews => "Customer Reviews",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic role of a column, inferred from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Revenue,
    Quantity,
    Date,
    StockLevel,
    DaysSupply,
    ProductName,
    CampaignName,
    Spend,
    Clicks,
    Impressions,
    /// Sales attributed to an advertising campaign.
    AttributedSales,
    Rating,
    Unclassified,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Quantity => "quantity",
            Self::Date => "date",
            Self::StockLevel => "stock_level",
            Self::DaysSupply => "days_supply",
            Self::ProductName => "product_name",
            Self::CampaignName => "campaign_name",
            Self::Spend => "spend",
            Self::Clicks => "clicks",
            Self::Impressions => "impressions",
            Self::AttributedSales => "attributed_sales",
            Self::Rating => "rating",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Alerts
// ============================================================================

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// A threshold-based finding raised by a domain analyzer.
///
/// Alerts carry no identity: running the same analysis twice yields two
/// equal but separate alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub domain: Domain,
    pub level: AlertLevel,
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(
        domain: Domain,
        level: AlertLevel,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            domain,
            level,
            title: title.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Loaded tables
// ============================================================================

/// A column that failed semantic coercion. Never fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub column: String,
    pub reason: String,
}

/// Diagnostic statistics recorded while loading a table.
///
/// These are for display only; no alert depends on them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadStats {
    /// File name the table was read from.
    pub source: String,
    pub rows: usize,
    pub columns: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_products: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parse_warnings: Vec<ParseWarning>,
}

/// A table with normalized column names and type-coerced numeric/date columns.
///
/// Column count and row order match the source file.
#[derive(Debug, Clone)]
pub struct CleanedTable {
    pub domain: Domain,
    pub frame: DataFrame,
    pub stats: LoadStats,
}

impl CleanedTable {
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// The loaded table of each domain, at most one per domain.
#[derive(Debug, Clone, Default)]
pub struct DomainTables {
    tables: BTreeMap<Domain, CleanedTable>,
}

impl DomainTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a table under its own domain, returning any table it replaced.
    pub fn insert(&mut self, table: CleanedTable) -> Option<CleanedTable> {
        self.tables.insert(table.domain, table)
    }

    pub fn get(&self, domain: Domain) -> Option<&CleanedTable> {
        self.tables.get(&domain)
    }

    pub fn contains(&self, domain: Domain) -> bool {
        self.tables.contains_key(&domain)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Tables in domain invocation order.
    pub fn iter(&self) -> impl Iterator<Item = &CleanedTable> {
        self.tables.values()
    }
}

impl FromIterator<CleanedTable> for DomainTables {
    fn from_iter<I: IntoIterator<Item = CleanedTable>>(iter: I) -> Self {
        let mut tables = Self::new();
        for table in iter {
            tables.insert(table);
        }
        tables
    }
}

/// Row-oriented copy of a table slice, used for preview lists in metrics.
pub type TableRows = Vec<serde_json::Map<String, serde_json::Value>>;

// ============================================================================
// Metrics records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    /// Calendar month as `YYYY-MM`.
    pub month: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPerformance {
    pub product_name: String,
    pub total_revenue: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_quantity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesMetrics {
    pub total_transactions: usize,
    pub total_quantity: f64,
    pub total_revenue: f64,
    pub avg_order_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_trends: Option<Vec<MonthlyRevenue>>,
    /// Month-over-month growth in percent, last month against the one before.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_growth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_transactions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_revenue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_products: Option<Vec<ProductPerformance>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryMetrics {
    pub total_products: usize,
    pub total_stock: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_stock_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overstock_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock_products: Option<TableRows>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overstock_products: Option<TableRows>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignPerformance {
    pub campaign_name: String,
    pub spend: f64,
    pub clicks: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales: Option<f64>,
    /// Return on ad spend (`sales / spend`), always finite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roas: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvertisingMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_spend: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_clicks: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_impressions: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_cpc: Option<f64>,
    /// Click-through rate in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_performance: Option<Vec<CampaignPerformance>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_acos_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_acos_campaigns: Option<Vec<CampaignPerformance>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewMetrics {
    pub total_reviews: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_rated_count: Option<usize>,
}

/// Metrics records of every domain that was analyzed in a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales: Option<SalesMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<InventoryMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advertising: Option<AdvertisingMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<ReviewMetrics>,
}

impl DomainMetrics {
    pub fn is_empty(&self) -> bool {
        self.sales.is_none()
            && self.inventory.is_none()
            && self.advertising.is_none()
            && self.reviews.is_none()
    }

    pub fn has(&self, domain: Domain) -> bool {
        match domain {
            Domain::Sales => self.sales.is_some(),
            Domain::Inventory => self.inventory.is_some(),
            Domain::Advertising => self.advertising.is_some(),
            Domain::Reviews => self.reviews.is_some(),
        }
    }
}

/// Headline scalar summary handed to the report renderer.
///
/// Fields from domains that were not analyzed stay at zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_revenue: f64,
    pub total_transactions: usize,
    pub avg_order_value: f64,
    pub monthly_growth: f64,
    pub total_products: usize,
    pub low_stock_products: usize,
    pub overstock_products: usize,
    pub total_ad_spend: f64,
    pub avg_cpc: f64,
    pub avg_rating: f64,
    pub total_reviews: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_serializes_domain_as_type() {
        let alert = Alert::new(
            Domain::Inventory,
            AlertLevel::Critical,
            "Critical Stock Shortage",
            "1 products have less than 3 days of stock",
        );
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "inventory");
        assert_eq!(json["level"], "critical");
    }

    #[test]
    fn test_absent_metrics_have_no_key() {
        let metrics = AdvertisingMetrics {
            total_spend: Some(0.0),
            ..Default::default()
        };
        let json = serde_json::to_value(&metrics).unwrap();
        assert!(json.get("total_spend").is_some());
        assert!(json.get("avg_cpc").is_none());
        assert!(json.get("ctr").is_none());
    }

    #[test]
    fn test_domain_order_and_names() {
        let names: Vec<_> = Domain::ALL.iter().map(|d| d.as_str()).collect();
        assert_eq!(names, vec!["sales", "inventory", "advertising", "reviews"]);
        assert_eq!(Domain::Advertising.section_title(), "Advertising ROI");
    }

    #[test]
    fn test_domain_metrics_presence() {
        let mut metrics = DomainMetrics::default();
        assert!(metrics.is_empty());
        metrics.reviews = Some(ReviewMetrics::default());
        assert!(metrics.has(Domain::Reviews));
        assert!(!metrics.has(Domain::Sales));
        assert!(!metrics.is_empty());
    }
}

//! Inventory analysis: stock totals and days-of-supply partitions.

use polars::prelude::*;
use tracing::{debug, info};

use crate::config::Thresholds;
use crate::error::Result;
use crate::resolver::resolve_for;
use crate::types::{
    Alert, AlertLevel, CleanedTable, ColumnRole, Domain, InventoryMetrics, TableRows,
};
use crate::utils::{frame_to_rows, numeric_values, sum_present};

pub fn analyze(table: &CleanedTable, thresholds: &Thresholds) -> Result<(InventoryMetrics, Vec<Alert>)> {
    info!("Analyzing inventory data...");

    let df = &table.frame;
    let columns = resolve_for(&table.column_names(), Domain::Inventory);

    let mut metrics = InventoryMetrics {
        total_products: df.height(),
        ..Default::default()
    };

    match columns.get(ColumnRole::StockLevel) {
        Some(name) => metrics.total_stock = sum_present(&numeric_values(df, name)?),
        None => debug!("No stock level column; total stock defaults to 0"),
    }

    let mut alerts = Vec::new();
    let Some(days_col) = columns.get(ColumnRole::DaysSupply) else {
        debug!("Skipping stock partitions: no days-of-supply column");
        return Ok((metrics, alerts));
    };

    let days = numeric_values(df, days_col)?;
    let low: Vec<bool> = days
        .iter()
        .map(|d| d.is_some_and(|v| v < thresholds.low_stock_days))
        .collect();
    let over: Vec<bool> = days
        .iter()
        .map(|d| d.is_some_and(|v| v > thresholds.overstock_days))
        .collect();
    let critical = days
        .iter()
        .zip(&low)
        .filter(|(d, is_low)| **is_low && d.is_some_and(|v| v < thresholds.critical_stock_days))
        .count();

    let low_count = low.iter().filter(|b| **b).count();
    let over_count = over.iter().filter(|b| **b).count();

    metrics.low_stock_count = Some(low_count);
    metrics.critical_stock_count = Some(critical);
    metrics.overstock_count = Some(over_count);
    metrics.low_stock_products = Some(preview(df, "low_stock", &low, thresholds.stock_preview_limit)?);
    metrics.overstock_products = Some(preview(df, "overstock", &over, thresholds.stock_preview_limit)?);

    if low_count > 0 {
        if critical > 0 {
            alerts.push(Alert::new(
                Domain::Inventory,
                AlertLevel::Critical,
                "Critical Stock Shortage",
                format!(
                    "{} products have less than {} days of stock",
                    critical, thresholds.critical_stock_days
                ),
            ));
        }
        alerts.push(Alert::new(
            Domain::Inventory,
            AlertLevel::Warning,
            "Low Stock Alert",
            format!(
                "{} products have less than {} days of stock",
                low_count, thresholds.low_stock_days
            ),
        ));
    }

    if over_count > 0 {
        alerts.push(Alert::new(
            Domain::Inventory,
            AlertLevel::Info,
            "Overstock Detected",
            format!(
                "{} products have more than {} days of stock",
                over_count, thresholds.overstock_days
            ),
        ));
    }

    Ok((metrics, alerts))
}

/// First `limit` rows selected by `mask`, in table order.
fn preview(df: &DataFrame, name: &str, mask: &[bool], limit: usize) -> PolarsResult<TableRows> {
    let mask = BooleanChunked::new(name.into(), mask);
    let selected = df.filter(&mask)?;
    frame_to_rows(&selected, Some(limit))
}

//! Sales analysis: totals, monthly trend, recent window, and product ranking.

use chrono::{Duration, NaiveDateTime};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::Thresholds;
use crate::error::Result;
use crate::resolver::{ResolvedColumns, resolve_for};
use crate::types::{
    Alert, AlertLevel, CleanedTable, ColumnRole, Domain, MonthlyRevenue, ProductPerformance, SalesMetrics,
};
use crate::utils::{datetime_values, mean_present, numeric_values, round2, sum_present, text_values};

/// Analyze a cleaned sales table.
///
/// `now` anchors the recent-transactions window.
pub fn analyze(
    table: &CleanedTable,
    thresholds: &Thresholds,
    now: NaiveDateTime,
) -> Result<(SalesMetrics, Vec<Alert>)> {
    info!("Analyzing sales data...");

    let df = &table.frame;
    let columns = resolve_for(&table.column_names(), Domain::Sales);

    let revenue = match columns.get(ColumnRole::Revenue) {
        Some(name) => Some(numeric_values(df, name)?),
        None => {
            debug!("No revenue column; revenue metrics default to 0");
            None
        }
    };
    let quantity = match columns.get(ColumnRole::Quantity) {
        Some(name) => Some(numeric_values(df, name)?),
        None => {
            debug!("No quantity column; total quantity defaults to 0");
            None
        }
    };

    let mut metrics = SalesMetrics {
        total_transactions: df.height(),
        total_quantity: quantity.as_deref().map_or(0.0, sum_present),
        total_revenue: revenue.as_deref().map_or(0.0, sum_present),
        avg_order_value: revenue
            .as_deref()
            .and_then(mean_present)
            .unwrap_or(0.0),
        ..Default::default()
    };

    if let Some(revenue) = revenue.as_deref() {
        date_metrics(&mut metrics, table, &columns, revenue, thresholds, now)?;
        metrics.top_products = top_products(table, &columns, revenue, quantity.as_deref(), thresholds)?;
    } else {
        debug!("Skipping monthly trend and product ranking: no revenue column");
    }

    let mut alerts = Vec::new();
    if let Some(growth) = metrics.monthly_growth
        && growth < thresholds.sales_decline_pct
    {
        alerts.push(Alert::new(
            Domain::Sales,
            AlertLevel::Warning,
            "Sales Decline",
            format!("Monthly sales declined by {:.1}%", growth.abs()),
        ));
    }

    Ok((metrics, alerts))
}

fn date_metrics(
    metrics: &mut SalesMetrics,
    table: &CleanedTable,
    columns: &ResolvedColumns,
    revenue: &[Option<f64>],
    thresholds: &Thresholds,
    now: NaiveDateTime,
) -> Result<()> {
    let Some(date_col) = columns.get(ColumnRole::Date) else {
        debug!("Skipping date-based sales metrics: no date column");
        return Ok(());
    };

    let dates = datetime_values(&table.frame, date_col)?;
    if dates.iter().all(Option::is_none) {
        debug!(
            "Skipping date-based sales metrics: no parseable dates in '{}'",
            date_col
        );
        return Ok(());
    }

    // Month labels sort lexically in calendar order.
    let mut by_month: BTreeMap<String, f64> = BTreeMap::new();
    for (date, value) in dates.iter().zip(revenue) {
        if let Some(date) = date {
            let total = by_month.entry(date.format("%Y-%m").to_string()).or_insert(0.0);
            *total += value.unwrap_or(0.0);
        }
    }

    let trends: Vec<MonthlyRevenue> = by_month
        .into_iter()
        .map(|(month, revenue)| MonthlyRevenue { month, revenue })
        .collect();

    metrics.monthly_growth = month_over_month_growth(&trends);
    metrics.monthly_trends = Some(trends);

    let Some(cutoff) = Duration::try_days(thresholds.recent_window_days)
        .and_then(|window| now.checked_sub_signed(window))
    else {
        debug!(
            "Skipping recent sales metrics: window of {} days is out of range",
            thresholds.recent_window_days
        );
        return Ok(());
    };
    let mut recent_transactions = 0;
    let mut recent_revenue = 0.0;
    for (date, value) in dates.iter().zip(revenue) {
        if date.is_some_and(|d| d >= cutoff) {
            recent_transactions += 1;
            recent_revenue += value.unwrap_or(0.0);
        }
    }
    metrics.recent_transactions = Some(recent_transactions);
    metrics.recent_revenue = Some(recent_revenue);

    Ok(())
}

/// Growth of the last month over the one before, in percent.
///
/// `None` with fewer than two months or a zero prior month.
pub fn month_over_month_growth(trends: &[MonthlyRevenue]) -> Option<f64> {
    let [.., previous, last] = trends else {
        debug!("Skipping monthly growth: fewer than two months of revenue");
        return None;
    };

    if previous.revenue == 0.0 {
        debug!(
            "Skipping monthly growth: prior month {} has zero revenue",
            previous.month
        );
        return None;
    }

    let growth = (last.revenue - previous.revenue) / previous.revenue * 100.0;
    growth.is_finite().then_some(growth)
}

fn top_products(
    table: &CleanedTable,
    columns: &ResolvedColumns,
    revenue: &[Option<f64>],
    quantity: Option<&[Option<f64>]>,
    thresholds: &Thresholds,
) -> Result<Option<Vec<ProductPerformance>>> {
    let Some(product_col) = columns.get(ColumnRole::ProductName) else {
        debug!("Skipping product ranking: no product name column");
        return Ok(None);
    };

    let names = text_values(&table.frame, product_col)?;
    let mut by_product: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for (idx, name) in names.into_iter().enumerate() {
        let Some(name) = name else { continue };
        let entry = by_product.entry(name).or_insert((0.0, 0.0));
        entry.0 += revenue[idx].unwrap_or(0.0);
        if let Some(quantity) = quantity {
            entry.1 += quantity[idx].unwrap_or(0.0);
        }
    }

    let mut ranked: Vec<ProductPerformance> = by_product
        .into_iter()
        .map(|(product_name, (total_revenue, total_quantity))| ProductPerformance {
            product_name,
            total_revenue: round2(total_revenue),
            total_quantity: quantity.map(|_| round2(total_quantity)),
        })
        .collect();

    // Stable sort keeps name order among equal revenues.
    ranked.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));
    ranked.truncate(thresholds.top_products_limit);

    Ok(Some(ranked))
}

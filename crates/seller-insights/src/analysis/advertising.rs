//! Advertising analysis: spend totals, cost per click, and campaign return.

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::Thresholds;
use crate::error::Result;
use crate::resolver::{ResolvedColumns, resolve_for};
use crate::types::{
    AdvertisingMetrics, Alert, AlertLevel, CampaignPerformance, CleanedTable, ColumnRole, Domain,
};
use crate::utils::{numeric_values, round2, sum_present, text_values};

pub fn analyze(
    table: &CleanedTable,
    thresholds: &Thresholds,
) -> Result<(AdvertisingMetrics, Vec<Alert>)> {
    info!("Analyzing advertising data...");

    let df = &table.frame;
    let columns = resolve_for(&table.column_names(), Domain::Advertising);

    let column_values = |role: ColumnRole| -> Result<Option<Vec<Option<f64>>>> {
        match columns.get(role) {
            Some(name) => Ok(Some(numeric_values(df, name)?)),
            None => {
                debug!("No {} column in advertising data", role);
                Ok(None)
            }
        }
    };
    let spend = column_values(ColumnRole::Spend)?;
    let clicks = column_values(ColumnRole::Clicks)?;
    let impressions = column_values(ColumnRole::Impressions)?;

    let mut metrics = AdvertisingMetrics {
        total_spend: spend.as_deref().map(sum_present),
        total_clicks: clicks.as_deref().map(sum_present),
        total_impressions: impressions.as_deref().map(sum_present),
        ..Default::default()
    };

    let total_spend = metrics.total_spend.unwrap_or(0.0);
    let total_clicks = metrics.total_clicks.unwrap_or(0.0);
    let total_impressions = metrics.total_impressions.unwrap_or(0.0);

    if total_spend > 0.0 && total_clicks > 0.0 {
        metrics.avg_cpc = Some(total_spend / total_clicks);
        if total_impressions > 0.0 {
            metrics.ctr = Some(total_clicks / total_impressions * 100.0);
        } else {
            debug!("Skipping click-through rate: no impressions");
        }
    } else {
        debug!("Skipping cost per click and click-through rate: spend or clicks is zero");
    }

    let mut alerts = Vec::new();
    let Some(campaigns) = campaign_totals(table, &columns, spend.as_deref(), clicks.as_deref())?
    else {
        return Ok((metrics, alerts));
    };

    if campaigns.iter().any(|c| c.roas.is_some()) {
        let min_roas = thresholds.min_roas();
        let underperforming: Vec<CampaignPerformance> = campaigns
            .iter()
            .filter(|c| c.roas.is_some_and(|r| r < min_roas))
            .cloned()
            .collect();

        metrics.high_acos_count = Some(underperforming.len());
        if !underperforming.is_empty() {
            let listed: Vec<&str> = underperforming
                .iter()
                .take(thresholds.high_acos_listing_limit)
                .map(|c| c.campaign_name.as_str())
                .collect();

            alerts.push(Alert::new(
                Domain::Advertising,
                AlertLevel::Warning,
                "High ACOS Campaigns",
                format!(
                    "{} campaigns have ACOS > {}%: {}",
                    underperforming.len(),
                    thresholds.high_acos,
                    listed.join(", ")
                ),
            ));

            metrics.high_acos_campaigns = Some(
                underperforming
                    .into_iter()
                    .take(thresholds.high_acos_listing_limit)
                    .collect(),
            );
        }
    }

    let mut ranked = campaigns;
    ranked.sort_by(|a, b| b.spend.total_cmp(&a.spend));
    ranked.truncate(thresholds.campaign_preview_limit);
    metrics.campaign_performance = Some(ranked);

    Ok((metrics, alerts))
}

/// Per-campaign spend, clicks, and (with a `sales` column) return on ad spend.
///
/// Campaigns come back in name order. `None` without a `campaign_name` column.
fn campaign_totals(
    table: &CleanedTable,
    columns: &ResolvedColumns,
    spend: Option<&[Option<f64>]>,
    clicks: Option<&[Option<f64>]>,
) -> Result<Option<Vec<CampaignPerformance>>> {
    let Some(campaign_col) = columns.get(ColumnRole::CampaignName) else {
        debug!("Skipping campaign breakdown: no campaign_name column");
        return Ok(None);
    };

    let sales = match columns.get(ColumnRole::AttributedSales) {
        Some(name) => Some(numeric_values(&table.frame, name)?),
        None => {
            debug!("Skipping return on ad spend: no sales column");
            None
        }
    };

    let names = text_values(&table.frame, campaign_col)?;
    let mut by_campaign: BTreeMap<String, (f64, f64, f64)> = BTreeMap::new();
    for (idx, name) in names.into_iter().enumerate() {
        let Some(name) = name else { continue };
        let entry = by_campaign.entry(name).or_insert((0.0, 0.0, 0.0));
        entry.0 += cell(spend, idx);
        entry.1 += cell(clicks, idx);
        entry.2 += cell(sales.as_deref(), idx);
    }

    let has_sales = sales.is_some();
    let has_roas = has_sales && spend.is_some();
    if has_sales && !has_roas {
        debug!("Skipping return on ad spend: no spend column");
    }
    Ok(Some(
        by_campaign
            .into_iter()
            .map(|(campaign_name, (spend, clicks, sales))| CampaignPerformance {
                campaign_name,
                spend,
                clicks,
                sales: has_sales.then_some(sales),
                roas: has_roas.then(|| return_on_spend(sales, spend)),
            })
            .collect(),
    ))
}

fn cell(values: Option<&[Option<f64>]>, idx: usize) -> f64 {
    values.and_then(|v| v[idx]).unwrap_or(0.0)
}

/// `sales / spend` rounded to cents, with zero spend and non-finite results as 0.
pub fn return_on_spend(sales: f64, spend: f64) -> f64 {
    let roas = sales / spend;
    if roas.is_finite() { round2(roas) } else { 0.0 }
}

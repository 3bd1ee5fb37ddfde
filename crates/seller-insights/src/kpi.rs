//! Headline KPI projection.

use crate::types::{DomainMetrics, KpiSummary};

/// Copy the headline fields of whichever domain metrics are present.
///
/// Absent domains and absent optional metrics leave their fields at zero.
pub fn summarize(metrics: &DomainMetrics) -> KpiSummary {
    let mut kpis = KpiSummary::default();

    if let Some(sales) = &metrics.sales {
        kpis.total_revenue = sales.total_revenue;
        kpis.total_transactions = sales.total_transactions;
        kpis.avg_order_value = sales.avg_order_value;
        kpis.monthly_growth = sales.monthly_growth.unwrap_or(0.0);
    }

    if let Some(inventory) = &metrics.inventory {
        kpis.total_products = inventory.total_products;
        kpis.low_stock_products = inventory.low_stock_count.unwrap_or(0);
        kpis.overstock_products = inventory.overstock_count.unwrap_or(0);
    }

    if let Some(ads) = &metrics.advertising {
        kpis.total_ad_spend = ads.total_spend.unwrap_or(0.0);
        kpis.avg_cpc = ads.avg_cpc.unwrap_or(0.0);
    }

    if let Some(reviews) = &metrics.reviews {
        kpis.avg_rating = reviews.avg_rating.unwrap_or(0.0);
        kpis.total_reviews = reviews.total_reviews;
    }

    kpis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdvertisingMetrics, ReviewMetrics, SalesMetrics};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_metrics_give_zero_summary() {
        assert_eq!(summarize(&DomainMetrics::default()), KpiSummary::default());
    }

    #[test]
    fn test_projection() {
        let metrics = DomainMetrics {
            sales: Some(SalesMetrics {
                total_transactions: 4,
                total_revenue: 410.0,
                avg_order_value: 102.5,
                monthly_growth: Some(73.3),
                ..Default::default()
            }),
            advertising: Some(AdvertisingMetrics {
                total_spend: Some(12.0),
                ..Default::default()
            }),
            reviews: Some(ReviewMetrics {
                total_reviews: 4,
                avg_rating: Some(3.0),
                low_rated_count: Some(2),
            }),
            ..Default::default()
        };

        let kpis = summarize(&metrics);
        assert_eq!(kpis.total_revenue, 410.0);
        assert_eq!(kpis.total_transactions, 4);
        assert_eq!(kpis.monthly_growth, 73.3);
        assert_eq!(kpis.total_ad_spend, 12.0);
        assert_eq!(kpis.avg_cpc, 0.0);
        assert_eq!(kpis.avg_rating, 3.0);
        assert_eq!(kpis.total_products, 0);
    }
}

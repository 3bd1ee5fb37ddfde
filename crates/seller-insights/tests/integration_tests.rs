//! Integration tests for the seller analytics pipeline.
//!
//! These tests verify end-to-end behavior using the CSV exports in
//! `tests/fixtures`.

use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use seller_insights::{
    Alert, AlertLevel, AnalyticsConfig, Analyzer, Domain, DomainMetrics, FileClassifier, InsightsError,
    MonthlyRevenue, Pipeline, PipelineStage, ProgressUpdate, TableLoader, Thresholds,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn reference_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 2, 20)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Load one fixture as `domain` and analyze it with default thresholds.
fn analyze_fixture(filename: &str, domain: Domain) -> (DomainMetrics, Vec<Alert>) {
    let table = TableLoader::load(&fixtures_path().join(filename), domain)
        .expect("Failed to load fixture");
    let mut metrics = DomainMetrics::default();
    let alerts = Analyzer::new(Thresholds::default())
        .with_now(reference_time())
        .analyze_table(&table, &mut metrics)
        .expect("Analysis should succeed");
    (metrics, alerts)
}

fn titles(alerts: &[Alert]) -> Vec<&str> {
    alerts.iter().map(|a| a.title.as_str()).collect()
}

// ============================================================================
// Sales
// ============================================================================

#[test]
fn test_sales_monthly_growth() {
    let (metrics, alerts) = analyze_fixture("sales_growth.csv", Domain::Sales);
    let sales = metrics.sales.unwrap();

    assert_eq!(sales.total_transactions, 4);
    assert_eq!(sales.total_revenue, 410.0);
    assert_eq!(sales.total_quantity, 8.0);
    assert_eq!(
        sales.monthly_trends.unwrap(),
        vec![
            MonthlyRevenue {
                month: "2023-01".to_string(),
                revenue: 150.0
            },
            MonthlyRevenue {
                month: "2023-02".to_string(),
                revenue: 260.0
            },
        ]
    );

    let growth = sales.monthly_growth.unwrap();
    assert!((growth - 73.333).abs() < 0.01, "growth was {}", growth);
    assert!(alerts.is_empty(), "Growth must not raise a decline alert");
}

#[test]
fn test_sales_recent_window_and_top_products() {
    let (metrics, _) = analyze_fixture("sales_growth.csv", Domain::Sales);
    let sales = metrics.sales.unwrap();

    assert_eq!(sales.recent_transactions, Some(2));
    assert_eq!(sales.recent_revenue, Some(260.0));

    let top = sales.top_products.unwrap();
    let names: Vec<&str> = top.iter().map(|p| p.product_name.as_str()).collect();
    assert_eq!(names, vec!["Mug", "Desk", "Lamp"]);
    assert_eq!(top[0].total_revenue, 300.0);
    assert_eq!(top[0].total_quantity, Some(6.0));
}

#[test]
fn test_sales_decline_with_messy_cells() {
    let (metrics, alerts) = analyze_fixture("sales_decline.csv", Domain::Sales);
    let sales = metrics.sales.unwrap();

    // "unknown" revenue stays unknown instead of counting as zero
    assert_eq!(sales.total_revenue, 2400.0);
    assert_eq!(sales.avg_order_value, 800.0);
    assert_eq!(sales.total_quantity, 5.0);

    let growth = sales.monthly_growth.unwrap();
    assert!((growth + 40.0).abs() < 1e-9, "growth was {}", growth);

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].title, "Sales Decline");
    assert_eq!(alerts[0].level, AlertLevel::Warning);
    assert_eq!(alerts[0].message, "Monthly sales declined by 40.0%");
}

#[test]
fn test_sales_load_stats() {
    let table = TableLoader::load(&fixtures_path().join("sales_growth.csv"), Domain::Sales).unwrap();

    assert_eq!(table.stats.source, "sales_growth.csv");
    assert_eq!(table.stats.rows, 4);
    assert_eq!(table.stats.columns, 5);
    assert_eq!(
        table.stats.date_range.as_deref(),
        Some("2023-01-05 to 2023-02-15")
    );
    assert_eq!(
        table.column_names(),
        vec!["order_date", "product_name", "quantity", "unit_price", "total_amount"]
    );
}

// ============================================================================
// Inventory
// ============================================================================

#[test]
fn test_inventory_critical_row_raises_both_alerts() {
    let (metrics, alerts) = analyze_fixture("inventory_critical.csv", Domain::Inventory);
    let inventory = metrics.inventory.unwrap();

    assert_eq!(inventory.low_stock_count, Some(1));
    assert_eq!(inventory.critical_stock_count, Some(1));
    assert_eq!(titles(&alerts), vec!["Critical Stock Shortage", "Low Stock Alert"]);
    assert_eq!(alerts[0].level, AlertLevel::Critical);
    assert_eq!(alerts[1].level, AlertLevel::Warning);
}

#[test]
fn test_inventory_overstock_row() {
    let (metrics, alerts) = analyze_fixture("inventory_overstock.csv", Domain::Inventory);
    let inventory = metrics.inventory.unwrap();

    assert_eq!(inventory.low_stock_count, Some(0));
    assert_eq!(inventory.overstock_count, Some(1));
    assert_eq!(titles(&alerts), vec!["Overstock Detected"]);
    assert_eq!(alerts[0].level, AlertLevel::Info);
}

// ============================================================================
// Advertising
// ============================================================================

#[test]
fn test_advertising_zero_spend_omits_derived_keys() {
    let (metrics, alerts) = analyze_fixture("advertising_zero_spend.csv", Domain::Advertising);
    let ads = metrics.advertising.unwrap();

    assert_eq!(ads.total_spend, Some(0.0));
    assert_eq!(ads.avg_cpc, None);
    assert_eq!(ads.ctr, None);
    assert!(alerts.is_empty());

    let json = serde_json::to_value(&ads).unwrap();
    assert!(json.get("avg_cpc").is_none());
    assert!(json.get("ctr").is_none());
    assert!(json.get("high_acos_count").is_none());
}

// ============================================================================
// Reviews
// ============================================================================

#[test]
fn test_reviews_low_ratings() {
    let (metrics, alerts) = analyze_fixture("reviews_mixed.csv", Domain::Reviews);
    let reviews = metrics.reviews.unwrap();

    assert_eq!(reviews.total_reviews, 4);
    assert_eq!(reviews.avg_rating, Some(3.0));
    assert_eq!(reviews.low_rated_count, Some(2));
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].title, "Low Ratings Alert");
    assert_eq!(alerts[0].message, "2 reviews have rating < 3");
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_discovery_buckets_exports() {
    let files = FileClassifier::discover(&fixtures_path().join("exports")).unwrap();

    let names = |paths: &[PathBuf]| -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    };

    assert_eq!(names(&files.sales), vec!["sales_2023.csv", "sales_backup.csv"]);
    assert_eq!(names(&files.inventory), vec!["inventory_report.csv"]);
    assert_eq!(names(&files.advertising), vec!["ad_campaigns.csv"]);
    assert_eq!(names(&files.reviews), vec!["customer_reviews.csv"]);
    assert_eq!(names(&files.other), vec!["supplier_list.csv"]);
    assert_eq!(names(files.ignored(Domain::Sales)), vec!["sales_backup.csv"]);
}

// ============================================================================
// Full Pipeline
// ============================================================================

#[test]
fn test_full_run_over_exports() {
    let out = tempfile::tempdir().unwrap();
    let config = AnalyticsConfig::builder()
        .input_dir(fixtures_path().join("exports"))
        .output_dir(out.path())
        .build()
        .unwrap();

    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = updates.clone();
    let outcome = Pipeline::builder()
        .config(config)
        .reference_time(reference_time())
        .on_progress(move |u| seen.lock().unwrap().push(u))
        .build()
        .unwrap()
        .run()
        .unwrap();

    // Only the first sales file is loaded
    assert_eq!(outcome.stats[&Domain::Sales].source, "sales_2023.csv");
    assert_eq!(outcome.kpis.total_revenue, 410.0);
    assert!(outcome.failures.is_empty());

    assert_eq!(
        titles(&outcome.alerts),
        vec![
            "Critical Stock Shortage",
            "Low Stock Alert",
            "Overstock Detected",
            "High ACOS Campaigns",
            "Low Ratings Alert",
        ]
    );
    assert_eq!(outcome.critical_alert_count(), 1);
    assert_eq!(
        outcome.alerts[3].message,
        "1 campaigns have ACOS > 40%: Generic"
    );

    let inventory = outcome.metrics.inventory.as_ref().unwrap();
    assert_eq!(inventory.total_stock, 324.0);
    assert_eq!(outcome.kpis.low_stock_products, 2);
    assert_eq!(outcome.kpis.overstock_products, 1);

    let ads = outcome.metrics.advertising.as_ref().unwrap();
    let campaigns = ads.campaign_performance.as_ref().unwrap();
    assert_eq!(campaigns[0].campaign_name, "Generic");
    assert_eq!(campaigns[0].roas, Some(1.5));
    assert_eq!(ads.high_acos_count, Some(1));

    let updates = updates.lock().unwrap();
    assert_eq!(updates.last().unwrap().stage, PipelineStage::Complete);
    assert!(updates.iter().all(|u| (0.0..=1.0).contains(&u.progress)));

    let report_path = outcome.report_path.as_ref().unwrap();
    assert!(report_path.starts_with(out.path()));
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
    assert_eq!(report["dashboard"]["alert_counts"]["critical"], 1);
    assert_eq!(report["sections"].as_array().unwrap().len(), 4);
    assert_eq!(report["raw_data"].as_array().unwrap().len(), 4);
    assert_eq!(report["alerts"]["items"][0]["type"], "inventory");
}

#[test]
fn test_run_without_usable_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.csv"), "a,b\n1,2\n").unwrap();

    let config = AnalyticsConfig::builder()
        .input_dir(dir.path())
        .write_report(false)
        .build()
        .unwrap();
    let err = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    assert!(matches!(err, InsightsError::NoUsableInput));
}

#[test]
fn test_custom_thresholds_change_alerts() {
    let config = AnalyticsConfig::builder()
        .input_dir(fixtures_path().join("exports"))
        .write_report(false)
        .thresholds(Thresholds {
            critical_stock_days: 1.0,
            overstock_days: 60.0,
            low_rating: 1.0,
            ..Thresholds::default()
        })
        .build()
        .unwrap();

    let outcome = Pipeline::builder()
        .config(config)
        .reference_time(reference_time())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(
        titles(&outcome.alerts),
        vec!["Low Stock Alert", "High ACOS Campaigns"]
    );
    assert!(outcome.report_path.is_none());
}

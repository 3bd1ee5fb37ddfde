//! Review analysis.

use tracing::{debug, info};

use crate::config::Thresholds;
use crate::error::Result;
use crate::resolver::resolve_for;
use crate::types::{Alert, AlertLevel, CleanedTable, ColumnRole, Domain, ReviewMetrics};
use crate::utils::{mean_present, numeric_values};

pub fn analyze(table: &CleanedTable, thresholds: &Thresholds) -> Result<(ReviewMetrics, Vec<Alert>)> {
    info!("Analyzing customer reviews...");

    let df = &table.frame;
    let columns = resolve_for(&table.column_names(), Domain::Reviews);

    let mut metrics = ReviewMetrics {
        total_reviews: df.height(),
        ..Default::default()
    };
    let mut alerts = Vec::new();

    let Some(rating_col) = columns.get(ColumnRole::Rating) else {
        debug!("Skipping rating metrics: no rating column");
        return Ok((metrics, alerts));
    };

    let ratings = numeric_values(df, rating_col)?;
    metrics.avg_rating = Some(mean_present(&ratings).unwrap_or(0.0));

    let low_rated = ratings
        .iter()
        .flatten()
        .filter(|r| **r < thresholds.low_rating)
        .count();
    metrics.low_rated_count = Some(low_rated);

    if low_rated > 0 {
        alerts.push(Alert::new(
            Domain::Reviews,
            AlertLevel::Warning,
            "Low Ratings Alert",
            format!("{} reviews have rating < {}", low_rated, thresholds.low_rating),
        ));
    }

    Ok((metrics, alerts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::TableLoader;
    use polars::prelude::*;

    fn table(ratings: &[&str]) -> CleanedTable {
        let df = df!("Rating" => ratings, "Review Text" => vec!["ok"; ratings.len()]).unwrap();
        TableLoader::clean(df, Domain::Reviews, "reviews.csv").unwrap()
    }

    #[test]
    fn test_ratings_scenario() {
        let (metrics, alerts) = analyze(&table(&["1", "1", "5", "5"]), &Thresholds::default()).unwrap();
        assert_eq!(metrics.total_reviews, 4);
        assert_eq!(metrics.avg_rating, Some(3.0));
        assert_eq!(metrics.low_rated_count, Some(2));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "Low Ratings Alert");
        assert_eq!(alerts[0].message, "2 reviews have rating < 3");
    }

    #[test]
    fn test_unparseable_ratings_are_ignored() {
        let (metrics, alerts) = analyze(&table(&["4", "great", "", "5"]), &Thresholds::default()).unwrap();
        assert_eq!(metrics.avg_rating, Some(4.5));
        assert_eq!(metrics.low_rated_count, Some(0));
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_all_null_ratings_yield_zero() {
        let (metrics, alerts) = analyze(&table(&["n/a", "?"]), &Thresholds::default()).unwrap();
        assert_eq!(metrics.avg_rating, Some(0.0));
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_no_rating_column() {
        let df = df!("stars" => &["1"]).unwrap();
        let t = TableLoader::clean(df, Domain::Reviews, "reviews.csv").unwrap();
        let (metrics, alerts) = analyze(&t, &Thresholds::default()).unwrap();
        assert_eq!(metrics.total_reviews, 1);
        assert!(metrics.avg_rating.is_none());
        assert!(alerts.is_empty());
    }
}

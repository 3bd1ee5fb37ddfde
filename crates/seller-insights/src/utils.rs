//! Shared utilities for the analytics pipeline.
//!
//! Column-name normalization, cell parsing, and column extraction helpers used
//! by the loader and by every domain analyzer.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::collections::HashMap;

use crate::types::TableRows;

// =============================================================================
// Column Names
// =============================================================================

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("Invalid regex: non-word characters"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace run"));
static SEPARATOR_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_+").expect("Invalid regex: separator run"));

/// Normalize a column name to its canonical token form.
///
/// Lowercases and trims, then replaces punctuation and whitespace runs with
/// a single `_`. Idempotent.
///
/// ```rust,ignore
/// assert_eq!(normalize_column_name("  Total Amount ($) "), "total_amount_");
/// assert_eq!(normalize_column_name("Order-Date"), "order_date");
/// ```
pub fn normalize_column_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let trimmed = lowered.trim();
    let no_punct = NON_WORD.replace_all(trimmed, "_");
    let no_space = WHITESPACE_RUN.replace_all(&no_punct, "_");
    SEPARATOR_RUN.replace_all(&no_space, "_").into_owned()
}

/// Make normalized names unique by suffixing repeats with `_2`, `_3`, ...
pub fn deduplicate_column_names(names: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut result = Vec::with_capacity(names.len());

    for name in names {
        let count = seen.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            result.push(name);
            continue;
        }

        let mut suffix = *count;
        let mut candidate = format!("{}_{}", name, suffix);
        while seen.contains_key(&candidate) {
            suffix += 1;
            candidate = format!("{}_{}", name, suffix);
        }
        seen.insert(candidate.clone(), 1);
        result.push(candidate);
    }

    result
}

// =============================================================================
// Cell Parsing
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Common error/missing value markers in exports.
pub const ERROR_MARKERS: [&str; 10] = [
    "error", "unknown", "n/a", "na", "null", "missing", "none", "#n/a", "nan", "-",
];

/// Remove currency, percent, and thousands formatting before numeric parsing.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Check if a string is an error/missing value marker.
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Parse a cell as a finite number.
///
/// Returns `None` for empty cells, error markers, and anything that does not
/// parse to a finite value (`inf` and `nan` literals included).
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    if is_error_marker(s) {
        return None;
    }
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %b %Y"];

/// Parse a cell as a date or date-time. Unparseable cells yield `None`.
pub fn parse_datetime_string(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() || is_error_marker(trimmed) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

// =============================================================================
// Column Extraction
// =============================================================================

/// Read a column as optional finite numbers.
///
/// Text columns are parsed cell by cell; numeric columns are cast. Cells that
/// cannot be read as a finite number become `None`.
pub fn numeric_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = df.column(column)?.as_materialized_series();

    if series.dtype() == &DataType::String {
        return Ok(series
            .str()?
            .into_iter()
            .map(|opt| opt.and_then(parse_numeric_string))
            .collect());
    }

    let floats = series.cast(&DataType::Float64)?;
    Ok(floats
        .f64()?
        .into_iter()
        .map(|opt| opt.filter(|v| v.is_finite()))
        .collect())
}

/// Read a column as optional strings.
pub fn text_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<String>>> {
    let series = df.column(column)?.as_materialized_series();
    let strings = series.cast(&DataType::String)?;
    Ok(strings
        .str()?
        .into_iter()
        .map(|opt| opt.map(|s| s.to_string()))
        .collect())
}

/// Read a column as optional date-times.
///
/// Accepts an already-coerced `Datetime` column or a text column.
pub fn datetime_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<NaiveDateTime>>> {
    let series = df.column(column)?.as_materialized_series();

    match series.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let raw = series.cast(&DataType::Int64)?;
            Ok(raw
                .i64()?
                .into_iter()
                .map(|opt| opt.and_then(|v| timestamp_to_naive(v, unit)))
                .collect())
        }
        DataType::String => Ok(series
            .str()?
            .into_iter()
            .map(|opt| opt.and_then(parse_datetime_string))
            .collect()),
        _ => {
            let strings = series.cast(&DataType::String)?;
            Ok(strings
                .str()?
                .into_iter()
                .map(|opt| opt.and_then(parse_datetime_string))
                .collect())
        }
    }
}

fn timestamp_to_naive(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
    };
    dt.map(|d| d.naive_utc())
}

// =============================================================================
// Aggregation Helpers
// =============================================================================

/// Sum over present values. An all-`None` input sums to zero.
pub fn sum_present(values: &[Option<f64>]) -> f64 {
    values.iter().flatten().fold(0.0, |acc, v| acc + v)
}

/// Mean over present values, `None` when there are none.
pub fn mean_present(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// Row Conversion
// =============================================================================

/// Convert a single cell to JSON. Non-finite floats become `null`.
pub fn any_value_to_json(value: &AnyValue) -> serde_json::Value {
    use serde_json::Value;

    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Float32(v) => serde_json::Number::from_f64(f64::from(*v))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::Float64(v) => serde_json::Number::from_f64(*v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        other => Value::String(other.to_string()),
    }
}

/// Copy the first `limit` rows (all rows when `None`) into row-oriented maps.
pub fn frame_to_rows(df: &DataFrame, limit: Option<usize>) -> PolarsResult<TableRows> {
    let height = limit.map_or(df.height(), |l| l.min(df.height()));
    let mut rows = Vec::with_capacity(height);

    for idx in 0..height {
        let mut row = serde_json::Map::new();
        for col in df.get_columns() {
            let value = col.get(idx)?;
            row.insert(col.name().to_string(), any_value_to_json(&value));
        }
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    // ==================== normalize_column_name tests ====================

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize_column_name("Order Date"), "order_date");
        assert_eq!(normalize_column_name("  Total-Amount  "), "total_amount");
        assert_eq!(normalize_column_name("Unit Price ($)"), "unit_price_");
        assert_eq!(normalize_column_name("days__of   supply"), "days_of_supply");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for name in [
            "Order Date",
            "  Total-Amount  ",
            "Unit Price ($)",
            "__weird!!name__",
            "Days of Supply",
            "already_normal",
        ] {
            let once = normalize_column_name(name);
            assert_eq!(normalize_column_name(&once), once, "input: {:?}", name);
        }
    }

    #[test]
    fn test_deduplicate_column_names() {
        let names = vec![
            "total".to_string(),
            "total".to_string(),
            "total_2".to_string(),
            "total".to_string(),
        ];
        assert_eq!(
            deduplicate_column_names(names),
            vec!["total", "total_2", "total_2_2", "total_3"]
        );
    }

    // ==================== parse tests ====================

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("$1,234.56"), Some(1234.56));
        assert_eq!(parse_numeric_string(" 42% "), Some(42.0));
        assert_eq!(parse_numeric_string("-3"), Some(-3.0));
        assert_eq!(parse_numeric_string("abc"), None);
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("N/A"), None);
        assert_eq!(parse_numeric_string("inf"), None);
        assert_eq!(parse_numeric_string("NaN"), None);
    }

    #[test]
    fn test_parse_datetime_formats() {
        let iso = parse_datetime_string("2023-01-05").unwrap();
        assert_eq!((iso.year(), iso.month(), iso.day()), (2023, 1, 5));

        let with_time = parse_datetime_string("2023-02-15 13:45:00").unwrap();
        assert_eq!(with_time.month(), 2);

        let us = parse_datetime_string("03/04/2023").unwrap();
        assert_eq!((us.month(), us.day()), (3, 4));

        let rfc = parse_datetime_string("2023-06-01T10:00:00Z").unwrap();
        assert_eq!(rfc.month(), 6);

        assert!(parse_datetime_string("not a date").is_none());
        assert!(parse_datetime_string("").is_none());
    }

    // ==================== extraction tests ====================

    #[test]
    fn test_numeric_values_from_text() {
        let df = df!("revenue" => &["100", "bad", "$50.5"]).unwrap();
        let values = numeric_values(&df, "revenue").unwrap();
        assert_eq!(values, vec![Some(100.0), None, Some(50.5)]);
    }

    #[test]
    fn test_numeric_values_from_integers() {
        let df = df!("clicks" => &[1i64, 2, 3]).unwrap();
        let values = numeric_values(&df, "clicks").unwrap();
        assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_sum_and_mean_skip_nulls() {
        let values = vec![Some(1.0), None, Some(5.0)];
        assert_eq!(sum_present(&values), 6.0);
        assert_eq!(mean_present(&values), Some(3.0));
        assert_eq!(sum_present(&[None, None]), 0.0);
        assert!(sum_present(&[]).is_sign_positive());
        assert_eq!(mean_present(&[None]), None);
    }

    #[test]
    fn test_frame_to_rows_limit() {
        let df = df!(
            "sku" => &["A", "B", "C"],
            "days" => &[1.0, f64::NAN, 3.0]
        )
        .unwrap();
        let rows = frame_to_rows(&df, Some(2)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["sku"], "A");
        assert_eq!(rows[1]["days"], serde_json::Value::Null);
    }
}

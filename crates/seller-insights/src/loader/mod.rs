//! Table loading and cleaning.
//!
//! Loading a domain table runs these steps, each tolerant of bad input:
//! 1. Read the CSV verbatim (every column as text)
//! 2. Normalize column names to canonical tokens
//! 3. Coerce the date column (date-bearing domains only)
//! 4. Coerce numeric columns with the domain's missing-value sentinel
//! 5. Record load statistics for display
//!
//! Only a file that cannot be read as delimited text is an error. A column
//! that fails coercion becomes a [`ParseWarning`] and stays null-filled.

mod coercion;
mod csv;

pub use coercion::{Coerced, MissingNumeric, coerce_datetime, coerce_numeric};
pub use csv::read_raw_table;

use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{InsightsError, Result, ResultExt};
use crate::resolver::{date_patterns, first_containing, numeric_patterns};
use crate::types::{CleanedTable, Domain, LoadStats, ParseWarning};
use crate::utils::{
    datetime_values, deduplicate_column_names, mean_present, normalize_column_name,
    numeric_values,
};

/// Loader for per-domain CSV exports.
pub struct TableLoader;

impl TableLoader {
    /// Missing-value sentinel for numeric columns of `domain`.
    pub fn missing_numeric(domain: Domain) -> MissingNumeric {
        match domain {
            Domain::Inventory => MissingNumeric::Zero,
            _ => MissingNumeric::Null,
        }
    }

    /// Load and clean one file as a `domain` table.
    pub fn load(path: &Path, domain: Domain) -> Result<CleanedTable> {
        info!("Loading {} data from {}", domain, path.display());

        let raw = read_raw_table(path)?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!("Loaded {} rows from {}", raw.height(), source);

        Self::clean(raw, domain, source).map_err(|e| match e {
            InsightsError::Load { .. } => e,
            other => InsightsError::load(path.display().to_string(), other),
        })
    }

    /// Clean an already-read raw table.
    pub fn clean(raw: DataFrame, domain: Domain, source: impl Into<String>) -> Result<CleanedTable> {
        let mut df = raw;
        let mut warnings = Vec::new();

        Self::normalize_columns(&mut df)?;
        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        let date_column = first_containing(&names, date_patterns(domain)).map(str::to_string);
        if let Some(ref col_name) = date_column {
            let coerced = coerce_datetime(df.column(col_name)?.as_materialized_series())
                .context(format!("Failed to coerce date column '{}'", col_name))?;
            if coerced.wholly_unparseable() {
                warnings.push(ParseWarning {
                    column: col_name.clone(),
                    reason: "no cell could be parsed as a date".to_string(),
                });
            }
            df.replace(col_name, coerced.series)?;
        }

        let patterns = numeric_patterns(domain);
        let missing = Self::missing_numeric(domain);
        for col_name in &names {
            if date_column.as_deref() == Some(col_name.as_str()) {
                continue;
            }
            if !patterns.iter().any(|p| col_name.contains(p)) {
                continue;
            }

            let coerced = coerce_numeric(df.column(col_name)?.as_materialized_series(), missing)
                .context(format!("Failed to coerce numeric column '{}'", col_name))?;
            if coerced.wholly_unparseable() {
                warnings.push(ParseWarning {
                    column: col_name.clone(),
                    reason: "no cell could be parsed as a number".to_string(),
                });
            }
            debug!(
                "Coerced '{}' to numeric ({} of {} non-empty cells parsed)",
                col_name, coerced.parsed, coerced.non_empty
            );
            df.replace(col_name, coerced.series)?;
        }

        for warning in &warnings {
            warn!(
                "Could not parse {} column '{}': {}",
                domain, warning.column, warning.reason
            );
        }

        let stats = Self::compute_stats(&df, domain, source.into(), date_column.as_deref(), warnings)?;

        Ok(CleanedTable {
            domain,
            frame: df,
            stats,
        })
    }

    fn normalize_columns(df: &mut DataFrame) -> Result<()> {
        let normalized: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|name| normalize_column_name(name.as_str()))
            .collect();
        let unique = deduplicate_column_names(normalized);
        df.set_column_names(unique.iter().map(String::as_str))?;
        Ok(())
    }

    fn compute_stats(
        df: &DataFrame,
        domain: Domain,
        source: String,
        date_column: Option<&str>,
        parse_warnings: Vec<ParseWarning>,
    ) -> Result<LoadStats> {
        let mut stats = LoadStats {
            source,
            rows: df.height(),
            columns: df.width(),
            parse_warnings,
            ..Default::default()
        };

        match domain {
            Domain::Sales => {
                stats.date_range = Some(Self::date_range(df, date_column)?);
            }
            Domain::Inventory => {
                if df.column("product_name").is_ok() {
                    let products = crate::utils::text_values(df, "product_name")?;
                    let distinct: HashSet<&String> = products.iter().flatten().collect();
                    stats.unique_products = Some(distinct.len());
                }
            }
            Domain::Reviews => {
                if df.column("rating").is_ok() {
                    let ratings = numeric_values(df, "rating")?;
                    stats.average_rating = Some(mean_present(&ratings).unwrap_or(0.0));
                }
            }
            Domain::Advertising => {}
        }

        Ok(stats)
    }

    fn date_range(df: &DataFrame, date_column: Option<&str>) -> Result<String> {
        let Some(col_name) = date_column else {
            return Ok("Not available".to_string());
        };

        let dates = datetime_values(df, col_name)?;
        let present = dates.iter().flatten();
        let min = present.clone().min();
        let max = present.max();

        Ok(match (min, max) {
            (Some(min), Some(max)) => format!("{} to {}", min.date(), max.date()),
            _ => "Not available".to_string(),
        })
    }
}

//! Cell-level type coercion for cleaned tables.
//!
//! Coercion never drops rows and never fails on bad cells: an unparseable
//! cell becomes the column's missing-value sentinel.

use polars::prelude::*;

use crate::utils::{parse_datetime_string, parse_numeric_string};

/// What an unparseable numeric cell turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingNumeric {
    /// Absence means "none": stock counts and supply days.
    Zero,
    /// Absence means "unknown": revenue and other sales figures.
    Null,
}

/// Result of coercing one column.
pub struct Coerced {
    pub series: Series,
    /// Cells that held something before coercion.
    pub non_empty: usize,
    /// Cells that parsed successfully.
    pub parsed: usize,
}

impl Coerced {
    /// True when the column had content but not a single cell parsed.
    pub fn wholly_unparseable(&self) -> bool {
        self.non_empty > 0 && self.parsed == 0
    }
}

fn non_empty(opt: Option<&str>) -> bool {
    opt.is_some_and(|s| !s.trim().is_empty())
}

/// Coerce a text column to `Float64`.
pub fn coerce_numeric(series: &Series, missing: MissingNumeric) -> PolarsResult<Coerced> {
    let text = series.cast(&DataType::String)?;
    let str_series = text.str()?;

    let mut non_empty_count = 0;
    let mut parsed_count = 0;
    let mut values: Vec<Option<f64>> = Vec::with_capacity(str_series.len());

    for opt_val in str_series.into_iter() {
        if non_empty(opt_val) {
            non_empty_count += 1;
        }
        let parsed = opt_val.and_then(parse_numeric_string);
        if parsed.is_some() {
            parsed_count += 1;
        }
        values.push(match missing {
            MissingNumeric::Zero => Some(parsed.unwrap_or(0.0)),
            MissingNumeric::Null => parsed,
        });
    }

    Ok(Coerced {
        series: Series::new(series.name().clone(), values),
        non_empty: non_empty_count,
        parsed: parsed_count,
    })
}

/// Coerce a text column to `Datetime(ms)`. Unparseable cells become null.
pub fn coerce_datetime(series: &Series) -> PolarsResult<Coerced> {
    let text = series.cast(&DataType::String)?;
    let str_series = text.str()?;

    let mut non_empty_count = 0;
    let mut parsed_count = 0;
    let mut millis: Vec<Option<i64>> = Vec::with_capacity(str_series.len());

    for opt_val in str_series.into_iter() {
        if non_empty(opt_val) {
            non_empty_count += 1;
        }
        let parsed = opt_val
            .and_then(parse_datetime_string)
            .map(|dt| dt.and_utc().timestamp_millis());
        if parsed.is_some() {
            parsed_count += 1;
        }
        millis.push(parsed);
    }

    let series = Series::new(series.name().clone(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

    Ok(Coerced {
        series,
        non_empty: non_empty_count,
        parsed: parsed_count,
    })
}

//! Raw CSV reading.
//!
//! Every column is read as text so the raw table is a verbatim copy of the
//! file; typing happens later in the cleaning step.

use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::error::{InsightsError, Result};

fn text_options() -> CsvReadOptions {
    // A zero-length schema inference reads every column as String.
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
}

/// Read a CSV file with three fallback strategies.
///
/// 1. Standard parsing with `"` quoting
/// 2. Parsing with quoting disabled
/// 3. Parsing pre-cleaned content (collapsed doubled quotes, blank lines removed)
pub fn read_raw_table(path: &Path) -> Result<DataFrame> {
    let shown = path.display().to_string();

    let content = std::fs::read_to_string(path).map_err(|e| InsightsError::load(&shown, e))?;
    if content.trim().is_empty() {
        return Err(InsightsError::load(&shown, "file contains no tabular data"));
    }

    match text_options()
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard loading of {} failed: {}", shown, e),
    }

    match text_options()
        .with_parse_options(CsvParseOptions::default().with_quote_char(None))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Loading {} without quotes failed: {}", shown, e),
    }

    let cleaned = clean_csv_content(&content);
    text_options()
        .into_reader_with_file_handle(Cursor::new(cleaned))
        .finish()
        .map_err(|e| InsightsError::load(&shown, e))
}

/// Collapse doubled quote artifacts and drop blank lines.
pub(crate) fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

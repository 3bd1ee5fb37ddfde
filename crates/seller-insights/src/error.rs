//! Error types for the seller analytics pipeline.
//!
//! Failures are isolated per domain: a [`InsightsError::Load`] or
//! [`InsightsError::Analysis`] only removes that domain from the run. The single
//! run-fatal condition is [`InsightsError::NoUsableInput`].
//!
//! Errors serialize as `{ code, message }` so a front end can branch on the code.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::types::Domain;

/// The main error type for the analytics pipeline.
#[derive(Error, Debug)]
pub enum InsightsError {
    /// A file could not be read or is not delimited text.
    #[error("Failed to load '{path}': {reason}")]
    Load { path: String, reason: String },

    /// A domain analyzer failed unexpectedly.
    #[error("Failed to analyze {domain} data: {reason}")]
    Analysis { domain: Domain, reason: String },

    /// No domain table could be loaded for this run.
    #[error("No usable input files: none of sales, inventory, advertising or reviews could be loaded")]
    NoUsableInput,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Report generation failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<InsightsError>,
    },
}

impl InsightsError {
    /// Build a load error for `path`.
    pub fn load(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build an analysis error for `domain`.
    pub fn analysis(domain: Domain, reason: impl ToString) -> Self {
        Self::Analysis {
            domain,
            reason: reason.to_string(),
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        InsightsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for front-end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Load { .. } => "LOAD_FAILED",
            Self::Analysis { .. } => "ANALYSIS_FAILED",
            Self::NoUsableInput => "NO_USABLE_INPUT",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the run can continue past this error.
    ///
    /// Load and analysis failures only drop one domain from the run.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Load { .. } | Self::Analysis { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

impl Serialize for InsightsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("InsightsError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analytics operations.
pub type Result<T> = std::result::Result<T, InsightsError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| InsightsError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(InsightsError::NoUsableInput.error_code(), "NO_USABLE_INPUT");
        assert_eq!(
            InsightsError::load("sales.csv", "not tabular").error_code(),
            "LOAD_FAILED"
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(InsightsError::load("a.csv", "bad").is_recoverable());
        assert!(InsightsError::analysis(Domain::Sales, "boom").is_recoverable());
        assert!(!InsightsError::NoUsableInput.is_recoverable());
        assert!(!InsightsError::InvalidConfig("x".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_serialization() {
        let error = InsightsError::analysis(Domain::Inventory, "column vanished");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("ANALYSIS_FAILED"));
        assert!(json.contains("inventory"));
    }

    #[test]
    fn test_with_context() {
        let error = InsightsError::load("x.csv", "empty").with_context("During discovery");
        assert!(error.to_string().contains("During discovery"));
        assert_eq!(error.error_code(), "LOAD_FAILED");
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_result_context() {
        let insights: Result<()> = Err(InsightsError::NoUsableInput);
        let error = insights.context("Scanning exports").unwrap_err();
        assert!(error.to_string().starts_with("Scanning exports: "));
        assert_eq!(error.error_code(), "NO_USABLE_INPUT");

        let polars: std::result::Result<(), polars::error::PolarsError> =
            Err(polars::error::PolarsError::NoData("empty".into()));
        let error = polars.context("Coercing column 'qty'").unwrap_err();
        assert!(error.to_string().starts_with("Coercing column 'qty': "));
        assert_eq!(error.error_code(), "POLARS_ERROR");
    }
}

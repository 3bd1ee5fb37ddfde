//! Pipeline module.
//!
//! This module provides the run orchestrator and its progress reporting.

mod builder;
pub mod progress;

pub use builder::{DomainFailure, Insights, Pipeline, PipelineBuilder, RunOutcome};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};

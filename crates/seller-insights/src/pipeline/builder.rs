//! Run orchestration.
//!
//! [`Pipeline`] sequences discovery, loading, analysis, KPI aggregation and
//! report generation. Everything runs synchronously on the calling thread.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::analysis::{AnalysisResult, Analyzer};
use crate::config::{AnalyticsConfig, ConfigValidationError};
use crate::discovery::{DiscoveredFiles, FileClassifier};
use crate::error::{InsightsError, Result};
use crate::kpi;
use crate::loader::TableLoader;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::reporting::ReportGenerator;
use crate::types::{Alert, AlertLevel, Domain, DomainMetrics, DomainTables, KpiSummary, LoadStats};

/// Why a domain is missing from a run's results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainFailure {
    pub domain: Domain,
    pub stage: PipelineStage,
    pub code: String,
    pub message: String,
}

impl DomainFailure {
    fn new(domain: Domain, stage: PipelineStage, error: &InsightsError) -> Self {
        Self {
            domain,
            stage,
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub files: DiscoveredFiles,
    #[serde(skip)]
    pub tables: DomainTables,
    pub stats: BTreeMap<Domain, LoadStats>,
    pub metrics: DomainMetrics,
    pub alerts: Vec<Alert>,
    pub kpis: KpiSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<DomainFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
    pub duration_ms: u64,
}

impl RunOutcome {
    pub fn critical_alert_count(&self) -> usize {
        self.alerts
            .iter()
            .filter(|a| a.level == AlertLevel::Critical)
            .count()
    }
}

/// Output of the analysis half of a run.
#[derive(Debug, Clone)]
pub struct Insights {
    pub metrics: DomainMetrics,
    pub alerts: Vec<Alert>,
    pub kpis: KpiSummary,
    pub failures: Vec<DomainFailure>,
}

/// The analytics pipeline.
///
/// ```rust,ignore
/// use seller_insights::{AnalyticsConfig, Pipeline};
///
/// let outcome = Pipeline::builder()
///     .config(AnalyticsConfig::builder().input_dir("exports").build()?)
///     .on_progress(|update| println!("{}", update.message))
///     .build()?
///     .run()?;
///
/// println!("{} critical alerts", outcome.critical_alert_count());
/// ```
pub struct Pipeline {
    config: AnalyticsConfig,
    analyzer: Analyzer,
    reporter: ReportGenerator,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Perform a full run over the configured input directory.
    ///
    /// # Errors
    ///
    /// Fails with [`InsightsError::NoUsableInput`] when no domain table could
    /// be loaded, or when the input directory or report cannot be accessed.
    /// Per-domain load and analysis failures are recorded in
    /// [`RunOutcome::failures`] instead.
    pub fn run(&self) -> Result<RunOutcome> {
        match self.run_internal() {
            Ok(outcome) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Analysis complete: {} alerts",
                    outcome.alerts.len()
                )));
                Ok(outcome)
            }
            Err(e) => {
                error!("Run failed: {}", e);
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                Err(e)
            }
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self) -> Result<RunOutcome> {
        let start_time = Instant::now();

        info!("Discovering input files in {}", self.config.input_dir.display());
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Discovery,
            0.0,
            "Scanning for data files...",
        ));
        let files = FileClassifier::discover(&self.config.input_dir)?;
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Discovery,
            1.0,
            format!("Found {} files", files.total_files()),
        ));

        let (tables, mut failures) = self.load_tables(&files);
        if tables.is_empty() {
            return Err(InsightsError::NoUsableInput);
        }

        let insights = self.analyze_tables(&tables);
        failures.extend(insights.failures);

        let report_path = if self.config.write_report {
            self.report_progress(ProgressUpdate::new(
                PipelineStage::ReportGeneration,
                0.0,
                "Writing dashboard report...",
            ));
            let report =
                ReportGenerator::build_report(&tables, &insights.metrics, &insights.alerts, &insights.kpis)
                    .and_then(|report| self.reporter.write_report(&report))
                    .map_err(|e| InsightsError::ReportGenerationFailed(format!("{:#}", e)))?;
            self.report_progress(ProgressUpdate::new(
                PipelineStage::ReportGeneration,
                1.0,
                format!("Report saved to {}", report.display()),
            ));
            Some(report)
        } else {
            info!("Report writing disabled");
            None
        };

        let stats = tables
            .iter()
            .map(|t| (t.domain, t.stats.clone()))
            .collect();

        Ok(RunOutcome {
            files,
            tables,
            stats,
            metrics: insights.metrics,
            alerts: insights.alerts,
            kpis: insights.kpis,
            failures,
            report_path,
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    /// Load the first discovered file of each domain.
    ///
    /// A file that fails to load is recorded as a failure and its domain is
    /// left out; loading continues with the next domain.
    pub fn load_tables(&self, files: &DiscoveredFiles) -> (DomainTables, Vec<DomainFailure>) {
        let mut tables = DomainTables::new();
        let mut failures = Vec::new();

        let total = files.domain_count();
        let mut done = 0;
        for domain in Domain::ALL {
            let Some(path) = files.first(domain) else {
                continue;
            };

            self.report_progress(ProgressUpdate::for_domain(
                PipelineStage::Loading,
                domain.as_str(),
                done,
                total,
                format!("Loading {}", path.display()),
            ));

            match TableLoader::load(path, domain) {
                Ok(table) => {
                    tables.insert(table);
                }
                Err(e) => {
                    warn!("Skipping {} data: {}", domain, e);
                    failures.push(DomainFailure::new(domain, PipelineStage::Loading, &e));
                }
            }
            done += 1;
        }

        info!("Loaded {} of {} domain tables", tables.len(), total);
        (tables, failures)
    }

    /// Run the analyzers and KPI aggregation on already-loaded tables.
    pub fn analyze_tables(&self, tables: &DomainTables) -> Insights {
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Analysis,
            0.0,
            format!("Analyzing {} tables...", tables.len()),
        ));
        let AnalysisResult {
            metrics,
            alerts,
            failed,
        } = self.analyzer.analyze_all(tables);

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Aggregation,
            0.0,
            "Summarizing KPIs...",
        ));
        let kpis = kpi::summarize(&metrics);

        let failures = failed
            .into_iter()
            .map(|(domain, message)| DomainFailure {
                domain,
                stage: PipelineStage::Analysis,
                code: "ANALYSIS_FAILED".to_string(),
                message,
            })
            .collect();

        Insights {
            metrics,
            alerts,
            kpis,
            failures,
        }
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<AnalyticsConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    reference_time: Option<NaiveDateTime>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    pub fn config(mut self, config: AnalyticsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a custom progress reporter, such as one forwarding to a UI.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Fix "now" for the recent-sales window instead of reading the clock.
    pub fn reference_time(mut self, now: NaiveDateTime) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// Build the pipeline. Fails if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let mut analyzer = Analyzer::new(config.thresholds.clone());
        if let Some(now) = self.reference_time {
            analyzer = analyzer.with_now(now);
        }

        Ok(Pipeline {
            reporter: ReportGenerator::new(config.output_dir.clone()),
            analyzer,
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}

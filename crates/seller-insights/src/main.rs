//! CLI entry point for the seller analytics pipeline.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use dotenv::dotenv;
use seller_insights::{
    AnalyticsConfig, Domain, FileClassifier, Pipeline, RunOutcome, resolve_for,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Heuristic analytics for marketplace seller exports",
    long_about = "Scans a directory for sales, inventory, advertising and review CSV exports,\n\
                  computes metrics and threshold alerts, and writes a dashboard report.\n\n\
                  Files are classified by name. Only the first file of each domain is loaded.\n\n\
                  EXAMPLES:\n  \
                  # Analyze the current directory\n  \
                  seller-insights\n\n  \
                  # Read exports from one place, write the report to another\n  \
                  seller-insights --input-dir exports/ --output-dir reports/\n\n  \
                  # Preview file classification and column roles\n  \
                  seller-insights --input-dir exports/ --dry-run\n\n  \
                  # Custom thresholds\n  \
                  seller-insights --config thresholds.json"
)]
struct Args {
    /// Directory scanned for CSV exports
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Directory the dashboard report is written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Directory for per-run log files
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// JSON configuration file with directories and alert thresholds
    ///
    /// Command-line directories take precedence over the file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output the run outcome as JSON to stdout instead of a summary
    ///
    /// Disables console logs; the log file is still written.
    #[arg(long)]
    json: bool,

    /// Show discovered files and resolved column roles without analyzing
    #[arg(long)]
    dry_run: bool,

    /// Do not write the dashboard report
    #[arg(long)]
    no_report: bool,
}

/// Build the run configuration from the optional config file and CLI overrides.
fn build_config(args: &Args) -> Result<AnalyticsConfig> {
    let mut config = match &args.config {
        Some(path) => AnalyticsConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AnalyticsConfig::default(),
    };

    if let Some(dir) = &args.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(dir) = &args.log_dir {
        config.log_dir = dir.clone();
    }
    if args.no_report || args.dry_run {
        config.write_report = false;
    }

    config.validate()?;
    Ok(config)
}

/// Initialize the tracing subscriber.
///
/// Installs a console layer (off with `--json`, `warn` with `--quiet`) and a
/// plain-text file layer writing one log file per run into `log_dir`.
fn init_logging(level: &str, quiet: bool, json_output: bool, log_dir: &Path) {
    let console_level = if quiet { "warn" } else { level };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(console_level));
    let console_layer =
        (!json_output).then(|| fmt::layer().with_target(false).with_filter(console_filter));

    let file_layer = match open_log_file(log_dir) {
        Ok(file) => {
            let file_filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(file_filter),
            )
        }
        Err(e) => {
            if !json_output {
                eprintln!("Warning: file logging disabled: {:#}", e);
            }
            None
        }
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

fn open_log_file(log_dir: &Path) -> Result<File> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let path = log_dir.join(format!(
        "seller_insights_{}.log",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    File::create(&path).with_context(|| format!("Failed to create log file {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables (RUST_LOG) from .env file
    dotenv().ok();

    let config = build_config(&args)?;
    init_logging(&args.log_level, args.quiet, args.json, &config.log_dir);

    info!("Input directory: {}", config.input_dir.display());

    let mut builder = Pipeline::builder().config(config);
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }
    let pipeline = builder.build()?;

    if args.dry_run {
        return run_dry_run(&pipeline);
    }

    match pipeline.run() {
        Ok(outcome) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_human_readable_summary(&outcome);
            }
            Ok(())
        }
        Err(e) => Err(anyhow::Error::from(e).context("Analysis failed")),
    }
}

/// Preview file classification and column roles.
///
/// Uses `println!` for user-facing output so it is visible at any log level.
fn run_dry_run(pipeline: &Pipeline) -> Result<()> {
    let input_dir = &pipeline.config().input_dir;
    let files = FileClassifier::discover(input_dir)?;

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of discovered data");
    println!("{}\n", "=".repeat(80));

    println!("DISCOVERED FILES");
    println!("{}", "-".repeat(40));
    println!("  Directory: {}", input_dir.display());
    for domain in Domain::ALL {
        let bucket = files.bucket(domain);
        println!("  {:<12} {}", format!("{}:", domain), bucket.len());
        for (i, path) in bucket.iter().enumerate() {
            let note = if i == 0 { "" } else { " (ignored)" };
            println!("    - {}{}", file_name(path), note);
        }
    }
    println!("  {:<12} {}", "other:", files.other.len());
    for path in &files.other {
        println!("    - {}", file_name(path));
    }
    println!();

    let (tables, failures) = pipeline.load_tables(&files);

    println!("COLUMN ROLES");
    println!("{}", "-".repeat(40));
    if tables.is_empty() {
        println!("  No tables could be loaded");
    }
    for table in tables.iter() {
        println!(
            "  {} ({} rows x {} columns, {})",
            table.domain,
            table.stats.rows,
            table.stats.columns,
            table.stats.source
        );
        let resolved = resolve_for(&table.column_names(), table.domain);
        if resolved.is_empty() {
            println!("    (no recognized columns)");
        }
        for (role, column) in resolved.iter() {
            println!("    {:<18} {}", role.as_str(), column);
        }
        for warning in &table.stats.parse_warnings {
            println!("    warning: {}: {}", warning.column, warning.reason);
        }
    }
    println!();

    if !failures.is_empty() {
        println!("LOAD FAILURES");
        println!("{}", "-".repeat(40));
        for failure in &failures {
            println!("  - [{}] {}: {}", failure.code, failure.domain, failure.message);
        }
        println!();
    }

    println!("{}", "=".repeat(80));
    println!("To run the analysis, run without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Print a human-readable summary of the run.
fn print_human_readable_summary(outcome: &RunOutcome) {
    let kpis = &outcome.kpis;

    println!();
    println!("{}", "=".repeat(80));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!("Data Sources:");
    for (domain, stats) in &outcome.stats {
        println!(
            "  {:<12} {} ({} rows x {} columns)",
            format!("{}:", domain),
            stats.source,
            stats.rows,
            stats.columns
        );
        if let Some(range) = &stats.date_range {
            println!("               Date range: {}", range);
        }
    }
    for failure in &outcome.failures {
        println!(
            "  {:<12} skipped [{}] {}",
            format!("{}:", failure.domain),
            failure.code,
            failure.message
        );
    }
    println!();

    println!("Key Metrics:");
    if outcome.metrics.sales.is_some() {
        println!("  Total revenue:       {:.2}", kpis.total_revenue);
        println!("  Transactions:        {}", kpis.total_transactions);
        println!("  Avg order value:     {:.2}", kpis.avg_order_value);
        println!("  Monthly growth:      {:.1}%", kpis.monthly_growth);
    }
    if outcome.metrics.inventory.is_some() {
        println!("  Products:            {}", kpis.total_products);
        println!("  Low stock products:  {}", kpis.low_stock_products);
        println!("  Overstock products:  {}", kpis.overstock_products);
    }
    if outcome.metrics.advertising.is_some() {
        println!("  Ad spend:            {:.2}", kpis.total_ad_spend);
        println!("  Avg CPC:             {:.2}", kpis.avg_cpc);
    }
    if outcome.metrics.reviews.is_some() {
        println!("  Reviews:             {}", kpis.total_reviews);
        println!("  Avg rating:          {:.2}", kpis.avg_rating);
    }
    println!();

    println!(
        "Alerts: {} ({} critical)",
        outcome.alerts.len(),
        outcome.critical_alert_count()
    );
    for alert in &outcome.alerts {
        println!(
            "  - [{}] {}: {}",
            alert.level.to_string().to_uppercase(),
            alert.title,
            alert.message
        );
    }
    println!();

    if let Some(path) = &outcome.report_path {
        println!("Report: {}", path.display());
    }
    println!("Duration: {}ms", outcome.duration_ms);
    println!("{}", "=".repeat(80));
}

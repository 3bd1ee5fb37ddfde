//! Report artifact generation.
//!
//! [`ReportGenerator`] turns one run's tables, metrics, alerts and KPIs into a
//! single timestamped JSON dashboard in the output directory.
//!
//! ```rust,ignore
//! use seller_insights::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_report(&tables, &metrics, &alerts, &kpis)?;
//! let path = ReportGenerator::new("output").write_report(&report)?;
//! ```

mod generator;

pub use generator::{
    AlertCounts, AlertsSection, Dashboard, DomainSection, RawSheet, ReportGenerator, SellerReport,
};

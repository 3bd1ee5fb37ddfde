//! Input file discovery.
//!
//! Files are bucketed by domain from their names alone. Only the first file
//! of each bucket is loaded; further files of the same domain are reported
//! and ignored.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{InsightsError, Result, ResultExt};
use crate::types::Domain;

/// Filename substrings per domain, in classification priority order.
pub const FILENAME_PATTERNS: [(Domain, &[&str]); 4] = [
    (Domain::Sales, &["sales", "transaction", "order"]),
    (Domain::Inventory, &["inventory", "stock"]),
    (Domain::Advertising, &["ad", "spend", "campaign"]),
    (Domain::Reviews, &["review", "rating"]),
];

/// Domain of a file name, or `None` for the "other" bucket.
pub fn classify(file_name: &str) -> Option<Domain> {
    let lowered = file_name.to_lowercase();
    FILENAME_PATTERNS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| lowered.contains(p)))
        .map(|(domain, _)| *domain)
}

/// Discovered files by bucket, each in file-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveredFiles {
    pub sales: Vec<PathBuf>,
    pub inventory: Vec<PathBuf>,
    pub advertising: Vec<PathBuf>,
    pub reviews: Vec<PathBuf>,
    pub other: Vec<PathBuf>,
}

impl DiscoveredFiles {
    pub fn bucket(&self, domain: Domain) -> &[PathBuf] {
        match domain {
            Domain::Sales => &self.sales,
            Domain::Inventory => &self.inventory,
            Domain::Advertising => &self.advertising,
            Domain::Reviews => &self.reviews,
        }
    }

    fn bucket_mut(&mut self, domain: Domain) -> &mut Vec<PathBuf> {
        match domain {
            Domain::Sales => &mut self.sales,
            Domain::Inventory => &mut self.inventory,
            Domain::Advertising => &mut self.advertising,
            Domain::Reviews => &mut self.reviews,
        }
    }

    /// The file that will be loaded for `domain`.
    pub fn first(&self, domain: Domain) -> Option<&Path> {
        self.bucket(domain).first().map(PathBuf::as_path)
    }

    /// Same-domain files beyond the first, which are never loaded.
    pub fn ignored(&self, domain: Domain) -> &[PathBuf] {
        self.bucket(domain).get(1..).unwrap_or(&[])
    }

    pub fn total_files(&self) -> usize {
        Domain::ALL.iter().map(|d| self.bucket(*d).len()).sum::<usize>() + self.other.len()
    }

    pub fn domain_count(&self) -> usize {
        Domain::ALL
            .iter()
            .filter(|d| !self.bucket(**d).is_empty())
            .count()
    }

    fn push(&mut self, path: PathBuf) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match classify(&name) {
            Some(domain) => self.bucket_mut(domain).push(path),
            None => self.other.push(path),
        }
    }
}

/// Scans a directory for CSV exports.
pub struct FileClassifier;

impl FileClassifier {
    /// Bucket every `.csv` file directly inside `dir`.
    pub fn discover(dir: &Path) -> Result<DiscoveredFiles> {
        let entries = std::fs::read_dir(dir)
            .map_err(InsightsError::from)
            .context(format!("Failed to read input directory {}", dir.display()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if path.is_file() && is_csv {
                paths.push(path);
            }
        }
        paths.sort();

        Ok(Self::classify_paths(paths))
    }

    /// Bucket an explicit list of paths, preserving their order.
    pub fn classify_paths(paths: impl IntoIterator<Item = PathBuf>) -> DiscoveredFiles {
        let mut files = DiscoveredFiles::default();
        for path in paths {
            files.push(path);
        }

        info!(
            "Found {} files: {} sales, {} inventory, {} advertising, {} reviews, {} other",
            files.total_files(),
            files.sales.len(),
            files.inventory.len(),
            files.advertising.len(),
            files.reviews.len(),
            files.other.len()
        );
        for domain in Domain::ALL {
            for path in files.ignored(domain) {
                warn!(
                    "Ignoring additional {} file {}: only the first file per domain is loaded",
                    domain,
                    path.display()
                );
            }
        }

        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_priority() {
        assert_eq!(classify("Sales_2023.csv"), Some(Domain::Sales));
        assert_eq!(classify("order_stock.csv"), Some(Domain::Sales));
        assert_eq!(classify("stock_levels.csv"), Some(Domain::Inventory));
        assert_eq!(classify("campaign_report.csv"), Some(Domain::Advertising));
        assert_eq!(classify("product_reviews.csv"), Some(Domain::Reviews));
        assert_eq!(classify("notes.csv"), None);
    }

    #[test]
    fn test_ad_substring_is_greedy() {
        // "ad" matches inside unrelated words and wins over reviews.
        assert_eq!(classify("bad_ratings.csv"), Some(Domain::Advertising));
    }

    #[test]
    fn test_first_file_per_bucket() {
        let files = FileClassifier::classify_paths(vec![
            PathBuf::from("a/sales_jan.csv"),
            PathBuf::from("a/sales_feb.csv"),
            PathBuf::from("a/misc.csv"),
        ]);
        assert_eq!(files.first(Domain::Sales), Some(Path::new("a/sales_jan.csv")));
        assert_eq!(files.ignored(Domain::Sales), &[PathBuf::from("a/sales_feb.csv")]);
        assert_eq!(files.first(Domain::Reviews), None);
        assert!(files.ignored(Domain::Reviews).is_empty());
        assert_eq!(files.other.len(), 1);
        assert_eq!(files.total_files(), 3);
        assert_eq!(files.domain_count(), 1);
    }

    #[test]
    fn test_discover_reads_only_csv() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["inventory.csv", "reviews.CSV", "sales.txt", "zeta.csv"] {
            std::fs::write(dir.path().join(name), "a\n1\n").unwrap();
        }
        std::fs::create_dir(dir.path().join("orders.csv")).unwrap();

        let files = FileClassifier::discover(dir.path()).unwrap();
        assert_eq!(files.inventory, vec![dir.path().join("inventory.csv")]);
        assert_eq!(files.reviews, vec![dir.path().join("reviews.CSV")]);
        assert!(files.sales.is_empty());
        assert_eq!(files.other, vec![dir.path().join("zeta.csv")]);
    }

    #[test]
    fn test_discover_missing_dir_is_error() {
        let err = FileClassifier::discover(Path::new("/no/such/dir")).unwrap_err();

        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(matches!(err, InsightsError::WithContext { .. }));
        assert!(err
            .to_string()
            .starts_with("Failed to read input directory /no/such/dir: "));
    }
}

//! Sort report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::spec::{EnumSortErrorKind, SpecSortCopy, SpecSortError};

/// Aggregate counters and diagnostics for one `sort_by_extension` run.
#[derive(Debug, Default, Clone)]
pub struct ReportSort {
    /// Total inspected directory/file entries.
    pub cnt_scanned: u64,
    /// Number of files copied into a bucket.
    pub cnt_copied: u64,
    /// Symlinks, special files, excluded entries and destination-root entries.
    pub cnt_skipped: u64,
    /// Bucket directories created by this run.
    pub cnt_buckets: u64,
    /// Committed copies, in traversal order.
    pub copies: Vec<SpecSortCopy>,
    /// Non-fatal warnings (metadata that could not be preserved).
    pub warnings: Vec<String>,
    /// Per-entry failures.
    pub errors: Vec<SpecSortError>,
}

impl ReportSort {
    /// Number of collected per-entry errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Errors of one kind only.
    pub fn errors_of(&self, kind: EnumSortErrorKind) -> impl Iterator<Item = &SpecSortError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_buckets".to_string(), self.cnt_buckets);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} scanned={} copied={} skipped={} buckets={} errors={} warnings={}",
            self.cnt_scanned,
            self.cnt_copied,
            self.cnt_skipped,
            self.cnt_buckets,
            self.error_count(),
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SORT]"))
    }
}

/// Mutable accumulator threaded through the walk.
///
/// Every `add_error`/`add_warning` is also emitted through `tracing` so that
/// failures show up on the log channel as they happen, not only at the end.
#[derive(Debug, Default, Clone)]
pub struct ReportSortBuilder {
    cnt_scanned: u64,
    cnt_skipped: u64,
    cnt_buckets: u64,
    copies: Vec<SpecSortCopy>,
    errors: Vec<SpecSortError>,
    warnings: Vec<String>,
}

impl ReportSortBuilder {
    /// Increment scanned count by one.
    pub fn add_scanned(&mut self) {
        self.cnt_scanned += 1;
    }

    /// Increment skipped count by one.
    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    /// Increment created-bucket count by one.
    pub fn add_bucket(&mut self) {
        self.cnt_buckets += 1;
    }

    /// Record one committed copy; also counts it as copied.
    pub fn add_copy(&mut self, spec_copy: SpecSortCopy) {
        tracing::debug!(
            src = %spec_copy.path_file_src.display(),
            dst = %spec_copy.path_file_dst.display(),
            "copied"
        );
        self.copies.push(spec_copy);
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Add one path-scoped error.
    pub fn add_error(&mut self, kind: EnumSortErrorKind, path: PathBuf, exception: String) {
        let spec_error = SpecSortError {
            kind,
            path,
            exception,
        };
        tracing::warn!("{spec_error}");
        self.errors.push(spec_error);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportSort {
        ReportSort {
            cnt_scanned: self.cnt_scanned,
            cnt_copied: self.copies.len() as u64,
            cnt_skipped: self.cnt_skipped,
            cnt_buckets: self.cnt_buckets,
            copies: self.copies,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}

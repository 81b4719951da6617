//! Sort specification models and top-level error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Bucket name used for files without an extension.
pub const C_BUCKET_NO_EXTENSION: &str = "no_extension";

/// Default cap on `name(N).ext` candidates tried per file.
pub const N_DISAMBIGUATION_MAX_DEFAULT: u64 = 10_000;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Per-entry failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSortErrorKind {
    /// A directory (or one of its entries) could not be enumerated.
    List,
    /// A bucket could not be created or a file could not be copied.
    Copy,
}

impl EnumSortErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Copy => "copy",
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `sort_by_extension`.
#[derive(Debug, Clone)]
pub struct SpecSortOptions {
    /// Bucket name for files that have no extension.
    pub name_bucket_no_extension: String,
    /// Maximum numeric suffix tried when a target name is taken.
    pub n_disambiguation_max: u64,
    /// Glob patterns matched against entry basenames; matches are skipped.
    pub patterns_exclude: Option<Vec<String>>,
    /// Copy permission bits (and xattrs on Linux) to targets.
    /// Access and modification times are copied regardless.
    pub if_preserve_permissions: bool,
}

impl Default for SpecSortOptions {
    fn default() -> Self {
        Self {
            name_bucket_no_extension: C_BUCKET_NO_EXTENSION.to_string(),
            n_disambiguation_max: N_DISAMBIGUATION_MAX_DEFAULT,
            patterns_exclude: None,
            if_preserve_permissions: true,
        }
    }
}

/// One per-entry failure: what failed, where, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSortError {
    pub kind: EnumSortErrorKind,
    /// Failed source directory, source file or bucket path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

impl fmt::Display for SpecSortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.kind.as_str(),
            self.path.display(),
            self.exception
        )
    }
}

/// One committed copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSortCopy {
    pub path_file_src: PathBuf,
    pub path_file_dst: PathBuf,
    /// Bucket directory name (lower-cased extension or the sentinel).
    pub name_bucket: String,
}

/// Root-level failures. Any of these aborts the run before traversal.
#[derive(Debug, Error)]
pub enum SortTreeError {
    /// Source path is missing or is not a directory.
    #[error("Invalid source {}: {reason}", .path.display())]
    InvalidSource { path: PathBuf, reason: String },

    /// Destination equals the source or contains it.
    #[error(
        "Destination {} contains source {}. Choose a different destination to avoid recursion.",
        .path_dst.display(),
        .path_src.display()
    )]
    RecursiveDestination {
        /// Normalized source directory.
        path_src: PathBuf,
        /// Normalized destination directory.
        path_dst: PathBuf,
    },

    /// Destination root could not be created or is unusable.
    #[error("Failed to create destination {}: {message}", .path.display())]
    DestCreationError { path: PathBuf, message: String },

    /// Invalid exclude pattern.
    #[error("Invalid exclude pattern: {0}")]
    InvalidPattern(String),

    /// Invalid option value.
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

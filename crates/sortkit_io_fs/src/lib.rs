//! `sortkit_io_fs` v1:
//! Rust-side extension sorter.
//!
//! Walks a source tree and copies every regular file into
//! `<destination>/<lower-cased extension>/`.
//!
//! - `sort`   : traversal and classify-and-copy orchestration
//! - `spec`   : options, records and errors
//! - `report` : run-time report model
//! - `util`   : shared helper functions

pub mod report;
pub mod sort;
pub mod spec;
mod util;

pub use report::{ReportSort, ReportSortBuilder};
pub use sort::sort_by_extension;
pub use spec::{
    C_BUCKET_NO_EXTENSION, EnumSortErrorKind, N_DISAMBIGUATION_MAX_DEFAULT, SortTreeError,
    SpecSortCopy, SpecSortError, SpecSortOptions,
};

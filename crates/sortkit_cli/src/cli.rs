use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sortkit_io_fs::{ReportSort, SpecSortOptions, sort_by_extension};

/// Exit code for fatal setup failures (bad source, recursive or
/// uncreatable destination).
pub const N_EXIT_FATAL: u8 = 2;

/// Recursively copy files from source to destination, sorted into
/// subdirectories by extension.
#[derive(Debug, Parser)]
#[command(name = "sortkit", version)]
#[command(about = "Copy a directory tree into per-extension folders", long_about = None)]
pub struct Cli {
    /// Path to source directory.
    pub source: PathBuf,

    /// Path to destination directory.
    #[arg(default_value = "dist")]
    pub dest: PathBuf,
}

impl Cli {
    pub fn run_from_args() -> ExitCode {
        Self::parse().run()
    }

    pub fn run(self) -> ExitCode {
        tracing::debug!(cli = ?self, "parsed arguments");

        match sort_by_extension(&self.source, &self.dest, SpecSortOptions::default()) {
            Ok(report) => {
                print_report_errors(&report);
                println!("Done.");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("sortkit error: {err}");
                ExitCode::from(N_EXIT_FATAL)
            }
        }
    }
}

/// Per-entry failures go to stderr even when the log filter hides `warn`.
fn print_report_errors(report: &ReportSort) {
    if report.error_count() == 0 {
        return;
    }
    if tracing::enabled!(target: "sortkit_io_fs::report", tracing::Level::WARN) {
        // Already logged one by one as they happened.
        eprintln!("{} entries failed, see messages above", report.error_count());
        return;
    }
    for spec_error in &report.errors {
        eprintln!("{spec_error}");
    }
}

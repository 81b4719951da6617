//! Filesystem tree traversal and classify-and-copy orchestration.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::GlobMatcher;

use crate::report::{ReportSort, ReportSortBuilder};
use crate::spec::{EnumSortErrorKind, SortTreeError, SpecSortCopy, SpecSortOptions};
use crate::util::{
    absolutize_path, compile_patterns_exclude, copy_file_with_metadata, derive_bucket_name,
    derive_candidate_name, is_excluded, is_within, normalize_path, validate_options,
};

#[derive(Debug, Clone)]
struct SpecDirEntry {
    path_dir_src_sub: PathBuf,
    name_dir: OsString,
}

#[derive(Debug, Clone)]
struct SpecFileEntry {
    path_file_src: PathBuf,
    name_file: OsString,
}

#[derive(Debug)]
struct SpecSortContext {
    path_dir_dst: PathBuf,
    spec_sort_options: SpecSortOptions,
    l_patterns_exclude: Vec<GlobMatcher>,
    set_buckets_ready: HashSet<String>,
    builder_sort_report: ReportSortBuilder,
}

/// Copy every regular file under `dir_source` into
/// `dir_destination/<extension>/`.
///
/// This function performs:
/// 1. Option validation and source checks ([`SortTreeError::InvalidSource`]).
/// 2. The recursion check: a destination equal to or containing the source
///    is rejected with [`SortTreeError::RecursiveDestination`] before any
///    write. A destination nested inside the source is allowed; its subtree
///    is skipped during the walk.
/// 3. Destination creation ([`SortTreeError::DestCreationError`]). A
///    destination root that is itself a symbolic link is rejected the same
///    way.
/// 4. A depth-first walk. Symlinks are never followed nor copied. Special
///    files are skipped. Regular files land in their bucket under a name
///    that never overwrites an existing entry (`name(1).ext`, `name(2).ext`,
///    ...).
///
/// Per-entry failures (unreadable directories, failed copies) are collected in
/// [`ReportSort::errors`] and never stop the walk.
pub fn sort_by_extension<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_sort_options: SpecSortOptions,
) -> Result<ReportSort, SortTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    validate_options(&spec_sort_options)?;
    let l_patterns_exclude =
        compile_patterns_exclude(spec_sort_options.patterns_exclude.as_deref())?;

    let path_dir_src = resolve_source(dir_source.as_ref())?;
    reject_symlink_destination(dir_destination.as_ref())?;
    let path_dir_dst = normalize_path(dir_destination.as_ref());
    if is_within(&path_dir_src, &path_dir_dst) {
        return Err(SortTreeError::RecursiveDestination {
            path_src: path_dir_src,
            path_dst: path_dir_dst,
        });
    }
    let path_dir_dst = prepare_destination(path_dir_dst)?;

    tracing::info!(
        src = %path_dir_src.display(),
        dst = %path_dir_dst.display(),
        "sorting by extension"
    );

    let mut spec_sort_ctx = SpecSortContext {
        path_dir_dst,
        spec_sort_options,
        l_patterns_exclude,
        set_buckets_ready: HashSet::new(),
        builder_sort_report: ReportSortBuilder::default(),
    };

    walk_directory(&path_dir_src, &mut spec_sort_ctx);
    let report = spec_sort_ctx.builder_sort_report.build();
    tracing::info!("{report}");
    Ok(report)
}

fn resolve_source(path_dir_src: &Path) -> Result<PathBuf, SortTreeError> {
    let invalid = |reason: String| SortTreeError::InvalidSource {
        path: path_dir_src.to_path_buf(),
        reason,
    };

    let meta_src = match fs::metadata(path_dir_src) {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(invalid("directory does not exist".to_string()));
        }
        Err(e) => return Err(invalid(e.to_string())),
    };
    if !meta_src.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }
    fs::canonicalize(path_dir_src).map_err(|e| invalid(e.to_string()))
}

/// Checked on the unresolved path: `normalize_path` would follow the link.
fn reject_symlink_destination(path_dir_dst: &Path) -> Result<(), SortTreeError> {
    let path_dir_dst_abs = absolutize_path(path_dir_dst);
    match fs::symlink_metadata(&path_dir_dst_abs) {
        Ok(meta_dir_dst) if meta_dir_dst.file_type().is_symlink() => {
            Err(SortTreeError::DestCreationError {
                path: path_dir_dst_abs,
                message: "Destination root path must not be a symbolic link.".to_string(),
            })
        }
        _ => Ok(()),
    }
}

fn prepare_destination(path_dir_dst: PathBuf) -> Result<PathBuf, SortTreeError> {
    let init_failed = |path: &Path, message: String| SortTreeError::DestCreationError {
        path: path.to_path_buf(),
        message,
    };

    fs::create_dir_all(&path_dir_dst).map_err(|e| init_failed(&path_dir_dst, e.to_string()))?;
    let meta_dir_dst =
        fs::metadata(&path_dir_dst).map_err(|e| init_failed(&path_dir_dst, e.to_string()))?;
    if !meta_dir_dst.is_dir() {
        return Err(init_failed(
            &path_dir_dst,
            "Destination root is not a directory.".to_string(),
        ));
    }
    fs::canonicalize(&path_dir_dst).map_err(|e| init_failed(&path_dir_dst, e.to_string()))
}

fn walk_directory(path_root: &Path, spec_sort_ctx: &mut SpecSortContext) {
    let iter_entries = match fs::read_dir(path_root) {
        Ok(iter) => iter,
        Err(e) => {
            spec_sort_ctx.builder_sort_report.add_error(
                EnumSortErrorKind::List,
                path_root.to_path_buf(),
                format!("Failed to read directory ({e})"),
            );
            return;
        }
    };

    let mut l_dirs: Vec<SpecDirEntry> = Vec::new();
    let mut l_files: Vec<SpecFileEntry> = Vec::new();

    for _entry_res in iter_entries {
        let entry = match _entry_res {
            Ok(v) => v,
            Err(e) => {
                spec_sort_ctx.builder_sort_report.add_error(
                    EnumSortErrorKind::List,
                    path_root.to_path_buf(),
                    format!("Failed to read directory entry ({e})"),
                );
                continue;
            }
        };
        spec_sort_ctx.builder_sort_report.add_scanned();

        let path_entry = entry.path();
        if is_within(&path_entry, &spec_sort_ctx.path_dir_dst) {
            tracing::debug!(path = %path_entry.display(), "destination subtree skipped");
            spec_sort_ctx.builder_sort_report.add_skipped();
            continue;
        }

        // `DirEntry::file_type` does not traverse symlinks.
        let cfg_file_type = match entry.file_type() {
            Ok(v) => v,
            Err(e) => {
                spec_sort_ctx.builder_sort_report.add_error(
                    EnumSortErrorKind::List,
                    path_entry,
                    format!("Failed to inspect entry ({e})"),
                );
                continue;
            }
        };
        if cfg_file_type.is_symlink() {
            tracing::debug!(path = %path_entry.display(), "symlink skipped");
            spec_sort_ctx.builder_sort_report.add_skipped();
            continue;
        }

        let c_name = entry.file_name();
        if is_excluded(&c_name, &spec_sort_ctx.l_patterns_exclude) {
            tracing::debug!(path = %path_entry.display(), "excluded by pattern");
            spec_sort_ctx.builder_sort_report.add_skipped();
            continue;
        }

        if cfg_file_type.is_dir() {
            l_dirs.push(SpecDirEntry {
                path_dir_src_sub: path_entry,
                name_dir: c_name,
            });
        } else if cfg_file_type.is_file() {
            l_files.push(SpecFileEntry {
                path_file_src: path_entry,
                name_file: c_name,
            });
        } else {
            tracing::debug!(path = %path_entry.display(), "special file skipped");
            spec_sort_ctx.builder_sort_report.add_skipped();
        }
    }

    l_dirs.sort_by(|a, b| a.name_dir.cmp(&b.name_dir));
    l_files.sort_by(|a, b| a.name_file.cmp(&b.name_file));

    for _dir_entry in l_dirs {
        walk_directory(&_dir_entry.path_dir_src_sub, spec_sort_ctx);
    }

    for _file_entry in l_files {
        handle_file_entry(_file_entry, spec_sort_ctx);
    }
}

fn handle_file_entry(spec_file_entry: SpecFileEntry, spec_sort_ctx: &mut SpecSortContext) {
    let name_bucket = derive_bucket_name(
        &spec_file_entry.name_file,
        &spec_sort_ctx.spec_sort_options.name_bucket_no_extension,
    );
    let Some(path_dir_bucket) = ensure_bucket(&name_bucket, spec_sort_ctx) else {
        return;
    };

    match copy_into_bucket(&spec_file_entry, &path_dir_bucket, spec_sort_ctx) {
        Ok(path_file_dst) => spec_sort_ctx.builder_sort_report.add_copy(SpecSortCopy {
            path_file_src: spec_file_entry.path_file_src,
            path_file_dst,
            name_bucket,
        }),
        Err(message) => spec_sort_ctx.builder_sort_report.add_error(
            EnumSortErrorKind::Copy,
            spec_file_entry.path_file_src,
            message,
        ),
    }
}

/// Bucket directory for `name_bucket`, created on first use.
///
/// A failed bucket is not remembered, so the next file of the same extension
/// retries (and reports) on its own.
fn ensure_bucket(name_bucket: &str, spec_sort_ctx: &mut SpecSortContext) -> Option<PathBuf> {
    let path_dir_bucket = spec_sort_ctx.path_dir_dst.join(name_bucket);
    if spec_sort_ctx.set_buckets_ready.contains(name_bucket) {
        return Some(path_dir_bucket);
    }

    match fs::symlink_metadata(&path_dir_bucket) {
        Ok(meta_bucket) if meta_bucket.is_dir() => {}
        Ok(_) => {
            spec_sort_ctx.builder_sort_report.add_error(
                EnumSortErrorKind::Copy,
                path_dir_bucket,
                "Bucket path exists and is not a directory".to_string(),
            );
            return None;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if let Err(e) = fs::create_dir(&path_dir_bucket) {
                spec_sort_ctx.builder_sort_report.add_error(
                    EnumSortErrorKind::Copy,
                    path_dir_bucket,
                    format!("Failed to create bucket directory ({e})"),
                );
                return None;
            }
            tracing::debug!(bucket = name_bucket, "bucket created");
            spec_sort_ctx.builder_sort_report.add_bucket();
        }
        Err(e) => {
            spec_sort_ctx.builder_sort_report.add_error(
                EnumSortErrorKind::Copy,
                path_dir_bucket,
                format!("Failed to inspect bucket directory ({e})"),
            );
            return None;
        }
    }

    spec_sort_ctx
        .set_buckets_ready
        .insert(name_bucket.to_string());
    Some(path_dir_bucket)
}

fn copy_into_bucket(
    spec_file_entry: &SpecFileEntry,
    path_dir_bucket: &Path,
    spec_sort_ctx: &mut SpecSortContext,
) -> Result<PathBuf, String> {
    let n_disambiguation_max = spec_sort_ctx.spec_sort_options.n_disambiguation_max;
    let if_preserve_permissions = spec_sort_ctx.spec_sort_options.if_preserve_permissions;

    for n_idx in 0..=n_disambiguation_max {
        let path_file_dst =
            path_dir_bucket.join(derive_candidate_name(&spec_file_entry.name_file, n_idx));
        match copy_file_with_metadata(
            &spec_file_entry.path_file_src,
            &path_file_dst,
            if_preserve_permissions,
            &mut spec_sort_ctx.builder_sort_report,
        ) {
            Ok(()) => return Ok(path_file_dst),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(format!(
                    "Failed to copy to {} ({e})",
                    path_file_dst.display()
                ));
            }
        }
    }

    Err(format!(
        "No free target name in {} after {n_disambiguation_max} numbered attempts",
        path_dir_bucket.display()
    ))
}

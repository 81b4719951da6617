use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobMatcher};

use crate::report::ReportSortBuilder;
use crate::spec::{SortTreeError, SpecSortOptions};

////////////////////////////////////////////////////////////////////////////////
// #region OptionsAndPatterns

pub(crate) fn validate_options(spec_sort_options: &SpecSortOptions) -> Result<(), SortTreeError> {
    if spec_sort_options.n_disambiguation_max == 0 {
        return Err(SortTreeError::InvalidOption(
            "`n_disambiguation_max` must be >= 1.".to_string(),
        ));
    }

    let name_bucket = spec_sort_options.name_bucket_no_extension.as_str();
    let mut iter_components = Path::new(name_bucket).components();
    let b_is_single_normal = matches!(iter_components.next(), Some(Component::Normal(_)))
        && iter_components.next().is_none();
    if !b_is_single_normal || name_bucket.contains(['/', '\\']) {
        return Err(SortTreeError::InvalidOption(format!(
            "`name_bucket_no_extension` must be a plain directory name, got `{name_bucket}`."
        )));
    }
    Ok(())
}

pub(crate) fn compile_patterns_exclude(
    patterns: Option<&[String]>,
) -> Result<Vec<GlobMatcher>, SortTreeError> {
    let Some(patterns) = patterns else {
        return Ok(Vec::new());
    };

    let mut l_glob = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let matcher = Glob::new(pattern)
            .map_err(|e| SortTreeError::InvalidPattern(format!("`{pattern}`: {e}")))?
            .compile_matcher();
        l_glob.push(matcher);
    }
    Ok(l_glob)
}

pub(crate) fn is_excluded(name_entry: &OsStr, l_patterns_exclude: &[GlobMatcher]) -> bool {
    l_patterns_exclude.iter().any(|p| p.is_match(name_entry))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

fn _clean_path_lexically(path: &Path) -> PathBuf {
    let mut path_clean = PathBuf::new();
    for part in path.components() {
        match part {
            Component::CurDir => {}
            Component::ParentDir => {
                path_clean.pop();
            }
            other => path_clean.push(other.as_os_str()),
        }
    }
    path_clean
}

/// Absolute, lexically cleaned form of `path`. Symlinks are not resolved.
pub(crate) fn absolutize_path(path: &Path) -> PathBuf {
    _clean_path_lexically(&_absolutize_path(path))
}

/// Absolute form of `path` with every existing prefix resolved through
/// `fs::canonicalize`. Works for paths that do not exist yet.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let path_abs = absolutize_path(path);

    let mut path_existing = path_abs.as_path();
    let mut l_tail: Vec<&OsStr> = Vec::new();
    loop {
        if let Ok(mut path_resolved) = fs::canonicalize(path_existing) {
            for part in l_tail.iter().rev() {
                path_resolved.push(part);
            }
            return path_resolved;
        }
        match (path_existing.parent(), path_existing.file_name()) {
            (Some(path_parent), Some(name)) => {
                l_tail.push(name);
                path_existing = path_parent;
            }
            _ => return path_abs.clone(),
        }
    }
}

/// `true` when `path` is `base` itself or lies underneath it.
pub(crate) fn is_within(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Naming

/// Extension of a basename, without the dot.
///
/// Leading dots never start an extension: `.bashrc`, `...` and `..a` have
/// none. `notes.` has an empty one.
fn _extension_of(name_file: &OsStr) -> Option<&OsStr> {
    let path_name = Path::new(name_file);
    let ext = path_name.extension()?;
    let stem = path_name.file_stem()?;
    if stem.as_encoded_bytes().iter().all(|b| *b == b'.') {
        return None;
    }
    Some(ext)
}

/// Bucket for a file: lower-cased extension, or `name_no_extension`.
pub(crate) fn derive_bucket_name(name_file: &OsStr, name_no_extension: &str) -> String {
    match _extension_of(name_file) {
        Some(ext) if !ext.is_empty() => ext.to_string_lossy().to_lowercase(),
        _ => name_no_extension.to_string(),
    }
}

/// `stem(n).ext` for `n >= 1`, `name_file` unchanged for `n == 0`.
pub(crate) fn derive_candidate_name(name_file: &OsStr, n_idx: u64) -> OsString {
    if n_idx == 0 {
        return name_file.to_os_string();
    }

    let Some(ext) = _extension_of(name_file) else {
        let mut name_candidate = name_file.to_os_string();
        name_candidate.push(format!("({n_idx})"));
        return name_candidate;
    };
    let mut name_candidate = Path::new(name_file)
        .file_stem()
        .map(OsStr::to_os_string)
        .unwrap_or_default();
    name_candidate.push(format!("({n_idx})."));
    name_candidate.push(ext);
    name_candidate
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Copy

/// Copy `path_file_src` into a new file at `path_file_dst`.
///
/// The target is opened with `create_new`, so an existing entry at
/// `path_file_dst` (file, directory or symlink) yields
/// `io::ErrorKind::AlreadyExists` and is never written through.
/// Access and modification times are always copied. With
/// `if_preserve_permissions`, mode bits (and xattrs on Linux) follow.
/// On any later failure the partial target is removed.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_preserve_permissions: bool,
    builder_sort_report: &mut ReportSortBuilder,
) -> Result<(), io::Error> {
    let mut file_src = fs::File::open(path_file_src)?;
    let file_dst = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path_file_dst)?;

    let res_copy = _fill_target(&mut file_src, file_dst).and_then(|_| {
        apply_metadata(
            path_file_src,
            path_file_dst,
            if_preserve_permissions,
            builder_sort_report,
        )
    });

    if let Err(e) = res_copy {
        let _ = fs::remove_file(path_file_dst);
        return Err(e);
    }
    Ok(())
}

/// Write all bytes and close the target before timestamps are applied.
fn _fill_target(file_src: &mut fs::File, mut file_dst: fs::File) -> Result<(), io::Error> {
    io::copy(file_src, &mut file_dst)?;
    drop(file_dst);
    Ok(())
}

fn apply_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_preserve_permissions: bool,
    builder_sort_report: &mut ReportSortBuilder,
) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;
    if !if_preserve_permissions {
        return Ok(());
    }

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst);

    // Last: a read-only mode must not block the steps above.
    if let Err(e) = fs::set_permissions(path_file_dst, stat_src.permissions()) {
        builder_sort_report.add_warning(format!(
            "Failed to preserve permissions on {} ({e})",
            path_file_dst.display()
        ));
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        let _ = xattr::set(path_file_dst, &name, &raw_value);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

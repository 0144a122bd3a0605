//! Directory-tree operations over a scope root: listing, size aggregation
//! and bulk removal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::fs_ops::TEMP_PREFIX;
use super::scope::RECORD_EXTENSION;
use super::CacheError;

/// Outcome of removing every child of a root directory.
#[derive(Debug, Default)]
pub struct ClearReport {
    /// Paths that were removed.
    pub removed: Vec<PathBuf>,
    /// Paths that could not be removed, with the reason.
    pub failures: Vec<(PathBuf, CacheError)>,
}

impl ClearReport {
    /// True if every removal succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of attempted removals.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.removed.len() + self.failures.len()
    }
}

/// List every record file beneath `root`.
///
/// Returned keys are relative to `root`, use `/` as separator on every
/// platform, and are sorted. A missing root yields an empty list.
#[must_use]
pub fn list_records(root: &Path) -> Vec<String> {
    let mut keys: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_record_name(&entry.file_name().to_string_lossy()))
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .ok()
                .map(relative_key)
        })
        .collect();
    keys.sort();
    keys
}

/// Total byte length of the file or tree at `path`.
///
/// A missing path is 0. Entries that cannot be inspected are skipped.
#[must_use]
pub fn tree_size(path: &Path) -> u64 {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return 0,
    };
    if metadata.is_file() {
        return metadata.len();
    }

    WalkDir::new(path)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| match entry.metadata() {
            Ok(m) => Some(m.len()),
            Err(e) => {
                log::debug!("Cannot stat {}: {}", entry.path().display(), e);
                None
            }
        })
        .sum()
}

/// Remove every direct child of `root`, leaving `root` itself in place.
///
/// Children are visited in sorted order. A failed removal does not stop the
/// pass; every child is attempted and failures are reported. Children that
/// cannot be enumerated are reported as failures against `root`.
pub fn clear_children(root: &Path) -> Result<ClearReport, CacheError> {
    let read_dir = fs::read_dir(root).map_err(|e| CacheError::from_io(root, e))?;
    Ok(remove_children(root, read_dir.map(|entry| entry.map(|e| e.path()))))
}

fn remove_children<I>(root: &Path, entries: I) -> ClearReport
where
    I: IntoIterator<Item = io::Result<PathBuf>>,
{
    let mut report = ClearReport::default();
    let mut children = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => children.push(path),
            // Vanished between listing and reading: nothing left to remove.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("Entry of {} disappeared: {}", root.display(), e);
            }
            Err(e) => {
                log::warn!("Cannot enumerate an entry of {}: {}", root.display(), e);
                let err = CacheError::from_io(root, e);
                report.failures.push((root.to_path_buf(), err));
            }
        }
    }
    children.sort();

    for child in children {
        // symlink_metadata: never follow a link out of the root.
        let result = match fs::symlink_metadata(&child) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&child),
            Ok(_) => fs::remove_file(&child),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                log::trace!("Removed {}", child.display());
                report.removed.push(child);
            }
            Err(e) => {
                log::warn!("Failed to remove {}: {}", child.display(), e);
                let err = CacheError::from_io(&child, e);
                report.failures.push((child, err));
            }
        }
    }
    report
}

fn is_record_name(name: &str) -> bool {
    !name.starts_with(TEMP_PREFIX)
        && name
            .strip_suffix(RECORD_EXTENSION)
            .is_some_and(|stem| stem.ends_with('.'))
}

fn relative_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

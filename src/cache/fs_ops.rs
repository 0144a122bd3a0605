//! Low-level filesystem helpers shared by the store.
//!
//! # Overview
//!
//! - Idempotent directory creation (concurrent creators both succeed)
//! - Atomic record replacement via a temp file in the target directory
//!   followed by a rename, so readers never see a half-written record
//! - Mapping of `io::Error` kinds onto [`CacheError`] variants

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::{CacheError, CacheResult};

/// Prefix of temp files created during atomic writes.
///
/// Listing skips files with this prefix so an interrupted write never shows
/// up as an entry.
pub const TEMP_PREFIX: &str = ".forge-tmp";

/// Create `dir` and any missing parents.
///
/// Succeeds if the directory already exists.
pub fn ensure_dir(dir: &Path) -> CacheResult<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        // Lost a creation race with another writer.
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(CacheError::from_io(dir, e)),
    }
}

/// Replace the file at `path` with `bytes`.
///
/// With `atomic` set, the bytes go to a temp file next to `path` which is
/// then renamed over it. On failure the previous content is left intact.
pub fn write_file(path: &Path, bytes: &[u8], atomic: bool) -> CacheResult<()> {
    if !atomic {
        return fs::write(path, bytes).map_err(|e| CacheError::from_io(path, e));
    }

    let parent = path
        .parent()
        .ok_or_else(|| CacheError::from_io(path, io::Error::other("path has no parent")))?;

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(parent)
        .map_err(|e| CacheError::from_io(parent, e))?;

    write_and_sync(&mut temp, bytes).map_err(|e| CacheError::from_io(temp.path(), e))?;

    temp.persist(path)
        .map_err(|e| CacheError::from_io(path, e.error))?;
    Ok(())
}

fn write_and_sync(temp: &mut NamedTempFile, bytes: &[u8]) -> io::Result<()> {
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.as_file().sync_all()
}

/// Read the whole file at `path`.
pub fn read_file(path: &Path) -> CacheResult<Vec<u8>> {
    fs::read(path).map_err(|e| CacheError::from_io(path, e))
}

/// Remove a single file.
pub fn remove_file(path: &Path) -> CacheResult<()> {
    fs::remove_file(path).map_err(|e| CacheError::from_io(path, e))
}

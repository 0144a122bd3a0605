//! The cache contract and its filesystem-backed implementation.
//!
//! # Overview
//!
//! [`CacheScheme`] is the single capability set every cache backend offers:
//! write, read, exists, list, size, metadata and clear. [`FileCache`] is the
//! implementation, storing one JSON record per key beneath the scope roots.
//!
//! # Failure model
//!
//! Trait methods never return errors. Missing entries come back as `None`,
//! `0` or an empty list; I/O and decode failures are logged with the
//! offending path and reported as `false` / `None`. The `try_*` methods on
//! [`FileCache`] expose the underlying [`CacheError`] for callers that need
//! the reason.
//!
//! # Concurrency
//!
//! No locks are taken. Writes replace records atomically (temp file plus
//! rename), but the read-then-write that preserves `createdAt` is not
//! isolated: concurrent writers to one key race and the last rename wins.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::record::{CacheMetadata, CacheRecord, JsonCodec, RecordCodec};
use super::scope::{is_root_key, validate_key, CacheRoots, Scope};
use super::tree::{self, ClearReport};
use super::{fs_ops, CacheError, CacheResult};
use crate::config::Config;

/// Result of a [`CacheScheme::clear`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearOutcome<T> {
    /// Whether the removal succeeded.
    pub success: bool,
    /// Payload of the removed entry, if it could be read beforehand.
    /// Always `None` for whole-scope clears.
    pub payload: Option<T>,
}

impl<T> ClearOutcome<T> {
    fn new(success: bool, payload: Option<T>) -> Self {
        Self { success, payload }
    }
}

/// Capabilities of a scoped cache backend.
pub trait CacheScheme {
    /// Absolute path for `key` in `scope`; the root when `key` is absent or empty.
    fn resolve_path(&self, scope: Scope, key: Option<&str>) -> PathBuf;

    /// Create the scope root if needed. True if it exists afterwards.
    fn ensure_root(&self, scope: Scope) -> bool;

    /// Store `payload` under `key`, preserving the original `createdAt`.
    fn write<T: Serialize + ?Sized>(&self, scope: Scope, key: &str, payload: &T) -> bool;

    /// Payload stored under `key`, or `None` if missing or unreadable.
    fn read<T: DeserializeOwned>(&self, scope: Scope, key: &str) -> Option<T>;

    /// Whether the resolved file or directory is present.
    fn exists(&self, scope: Scope, key: Option<&str>) -> bool;

    /// Every record key in `scope`, relative to the root.
    fn list(&self, scope: Scope) -> Vec<String>;

    /// Byte size of one entry, or of the whole scope when `key` is absent
    /// or empty. 0 if missing.
    ///
    /// Keys get `.json` appended like everywhere else, so a plain
    /// subdirectory is only counted through the scope total.
    fn size(&self, scope: Scope, key: Option<&str>) -> u64;

    /// Provenance timestamps of `key`. `None` without a key.
    fn metadata(&self, scope: Scope, key: Option<&str>) -> Option<CacheMetadata>;

    /// Remove one entry, or every entry of the scope when `key` is absent
    /// or the empty string. Separator-only keys such as `"/"` are rejected
    /// like any other missing entry key.
    fn clear<T: DeserializeOwned>(&self, scope: Scope, key: Option<&str>) -> ClearOutcome<T>;
}

/// Filesystem-backed cache store.
///
/// Holds only the two root paths and the codec; every call round-trips
/// through the filesystem.
#[derive(Debug, Clone)]
pub struct FileCache<C: RecordCodec = JsonCodec> {
    roots: CacheRoots,
    codec: C,
    atomic_writes: bool,
}

impl FileCache<JsonCodec> {
    /// Create a store with the pretty JSON codec and atomic writes.
    #[must_use]
    pub fn new(roots: CacheRoots) -> Self {
        Self::with_codec(roots, JsonCodec::default())
    }

    /// Create a store from the layered application configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let roots = config.roots()?;
        log::debug!(
            "Cache roots: user={}, workspace={}",
            roots.root(Scope::User).display(),
            roots.root(Scope::Workspace).display()
        );
        Ok(Self::with_codec(roots, JsonCodec::new(config.pretty))
            .with_atomic_writes(config.atomic_writes))
    }
}

impl<C: RecordCodec> FileCache<C> {
    /// Create a store with a custom record codec.
    #[must_use]
    pub fn with_codec(roots: CacheRoots, codec: C) -> Self {
        Self {
            roots,
            codec,
            atomic_writes: true,
        }
    }

    /// Enable or disable temp-file-and-rename writes.
    #[must_use]
    pub fn with_atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic_writes = atomic;
        self
    }

    /// The storage roots of this store.
    #[must_use]
    pub fn roots(&self) -> &CacheRoots {
        &self.roots
    }

    /// Resolve and validate the path of an entry key.
    fn entry_path(&self, scope: Scope, key: &str) -> CacheResult<PathBuf> {
        if is_root_key(key) {
            return Err(CacheError::InvalidKey {
                key: key.to_string(),
                reason: "an entry key is required",
            });
        }
        validate_key(key)?;
        Ok(self.roots.resolve(scope, Some(key)))
    }

    /// Validate an optional key, mapping empty keys to the root.
    fn target_path(&self, scope: Scope, key: Option<&str>) -> CacheResult<PathBuf> {
        if let Some(k) = key {
            validate_key(k)?;
        }
        Ok(self.roots.resolve(scope, key))
    }

    /// Create the root directory of `scope`.
    pub fn try_ensure_root(&self, scope: Scope) -> CacheResult<()> {
        fs_ops::ensure_dir(self.roots.root(scope))
    }

    /// Write a record, returning the path it was stored at.
    pub fn try_write<T: Serialize + ?Sized>(
        &self,
        scope: Scope,
        key: &str,
        payload: &T,
    ) -> CacheResult<PathBuf> {
        let path = self.entry_path(scope, key)?;
        self.try_ensure_root(scope)?;
        if let Some(parent) = path.parent() {
            fs_ops::ensure_dir(parent)?;
        }

        let previous = self.previous_created_at(&path);
        let record = CacheRecord::stamped(payload, previous, Utc::now());
        let bytes = self
            .codec
            .encode(&record)
            .map_err(|source| CacheError::Encode {
                path: path.clone(),
                source,
            })?;

        fs_ops::write_file(&path, &bytes, self.atomic_writes)?;
        log::debug!(
            "Wrote {} ({} bytes, {})",
            path.display(),
            bytes.len(),
            if previous.is_some() { "updated" } else { "created" }
        );
        Ok(path)
    }

    /// Read and decode the full record stored under `key`.
    pub fn try_read_record<T: DeserializeOwned>(
        &self,
        scope: Scope,
        key: &str,
    ) -> CacheResult<CacheRecord<T>> {
        let path = self.entry_path(scope, key)?;
        let bytes = fs_ops::read_file(&path)?;
        self.codec
            .decode(&bytes)
            .map_err(|source| CacheError::CorruptRecord { path, source })
    }

    /// Read the payload stored under `key`.
    pub fn try_read<T: DeserializeOwned>(&self, scope: Scope, key: &str) -> CacheResult<T> {
        self.try_read_record(scope, key).map(|record| record.data)
    }

    /// Read the provenance timestamps stored under `key`.
    pub fn try_metadata(&self, scope: Scope, key: &str) -> CacheResult<CacheMetadata> {
        let path = self.entry_path(scope, key)?;
        let bytes = fs_ops::read_file(&path)?;
        self.codec
            .decode_metadata(&bytes)
            .map_err(|source| CacheError::CorruptRecord { path, source })
    }

    /// Remove one entry, returning its payload when it was readable.
    pub fn try_clear_entry<T: DeserializeOwned>(
        &self,
        scope: Scope,
        key: &str,
    ) -> CacheResult<Option<T>> {
        let (payload, removed) = self.remove_entry(scope, key);
        removed.map(|()| payload)
    }

    /// Remove every entry of `scope`, keeping the root directory.
    ///
    /// Best-effort: every child of the root is attempted even after a
    /// failure, and [`CacheError::PartialClear`] is returned if any remain.
    pub fn try_clear_scope(&self, scope: Scope) -> CacheResult<ClearReport> {
        self.try_ensure_root(scope)?;
        let root = self.roots.root(scope);
        let report = tree::clear_children(root)?;
        if !report.all_succeeded() {
            return Err(CacheError::PartialClear {
                root: root.to_path_buf(),
                removed: report.removed.len(),
                total: report.total_count(),
            });
        }
        log::debug!(
            "Cleared {} entries from {} scope",
            report.removed.len(),
            scope
        );
        Ok(report)
    }

    /// Remove the whole scope's contents. True on full success.
    pub fn clear_scope(&self, scope: Scope) -> bool {
        self.try_clear_scope(scope)
            .map_err(|e| log::warn!("Failed to clear {} cache: {}", scope, e))
            .is_ok()
    }

    /// Remove a single entry, reading its payload first.
    pub fn clear_entry<T: DeserializeOwned>(&self, scope: Scope, key: &str) -> ClearOutcome<T> {
        let (payload, removed) = self.remove_entry(scope, key);
        match removed {
            Ok(()) => ClearOutcome::new(true, payload),
            Err(e) => {
                if e.is_not_found() {
                    log::debug!("Nothing to clear: {}", e);
                } else {
                    log::warn!("Failed to clear cache entry: {}", e);
                }
                ClearOutcome::new(false, payload)
            }
        }
    }

    fn remove_entry<T: DeserializeOwned>(
        &self,
        scope: Scope,
        key: &str,
    ) -> (Option<T>, CacheResult<()>) {
        let path = match self.entry_path(scope, key) {
            Ok(path) => path,
            Err(e) => return (None, Err(e)),
        };
        let payload = self.try_read(scope, key).ok();
        let removed = fs_ops::remove_file(&path);
        if removed.is_ok() {
            log::debug!("Removed {}", path.display());
        }
        (payload, removed)
    }

    /// `createdAt` of the record currently at `path`, if any.
    fn previous_created_at(&self, path: &Path) -> Option<DateTime<Utc>> {
        if !path.exists() {
            return None;
        }
        let result = fs_ops::read_file(path).and_then(|bytes| {
            self.codec
                .decode_metadata(&bytes)
                .map_err(|source| CacheError::CorruptRecord {
                    path: path.to_path_buf(),
                    source,
                })
        });
        match result {
            Ok(meta) => Some(meta.created_at),
            Err(e) => {
                log::warn!("Replacing unreadable record, createdAt reset: {}", e);
                None
            }
        }
    }
}

/// Log a lookup failure, keeping plain absence at debug level.
fn log_lookup_failure(err: &CacheError) {
    if err.is_not_found() {
        log::debug!("Cache miss: {}", err);
    } else {
        log::warn!("Cache lookup failed: {}", err);
    }
}

impl<C: RecordCodec> CacheScheme for FileCache<C> {
    fn resolve_path(&self, scope: Scope, key: Option<&str>) -> PathBuf {
        self.roots.resolve(scope, key)
    }

    fn ensure_root(&self, scope: Scope) -> bool {
        match self.try_ensure_root(scope) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to create {} cache root: {}", scope, e);
                false
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, scope: Scope, key: &str, payload: &T) -> bool {
        match self.try_write(scope, key, payload) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Failed to write cache entry '{}': {}", key, e);
                false
            }
        }
    }

    fn read<T: DeserializeOwned>(&self, scope: Scope, key: &str) -> Option<T> {
        self.try_read(scope, key)
            .map_err(|e| log_lookup_failure(&e))
            .ok()
    }

    fn exists(&self, scope: Scope, key: Option<&str>) -> bool {
        match self.target_path(scope, key) {
            Ok(path) => path.try_exists().unwrap_or(false),
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }

    fn list(&self, scope: Scope) -> Vec<String> {
        self.ensure_root(scope);
        tree::list_records(self.roots.root(scope))
    }

    fn size(&self, scope: Scope, key: Option<&str>) -> u64 {
        match self.target_path(scope, key) {
            Ok(path) => tree::tree_size(&path),
            Err(e) => {
                log::warn!("{}", e);
                0
            }
        }
    }

    fn metadata(&self, scope: Scope, key: Option<&str>) -> Option<CacheMetadata> {
        let key = key.filter(|k| !is_root_key(k))?;
        self.try_metadata(scope, key)
            .map_err(|e| log_lookup_failure(&e))
            .ok()
    }

    fn clear<T: DeserializeOwned>(&self, scope: Scope, key: Option<&str>) -> ClearOutcome<T> {
        match key.filter(|k| !k.is_empty()) {
            Some(key) => self.clear_entry(scope, key),
            None => ClearOutcome::new(self.clear_scope(scope), None),
        }
    }
}

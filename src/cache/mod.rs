//! Scoped, file-backed cache store.
//!
//! This module maps a `(scope, key)` pair onto a JSON record on disk and
//! tracks when each record was first and last written.
//!
//! # Architecture
//!
//! * [`scope`]: Scope enum, storage roots and key-to-path resolution.
//! * [`record`]: The on-disk envelope and the pluggable [`RecordCodec`].
//! * [`fs_ops`]: Idempotent directory creation and atomic file replacement.
//! * [`tree`]: Recursive listing, size aggregation and bulk removal.
//! * [`store`]: The [`CacheScheme`] contract and its filesystem
//!   implementation, [`FileCache`].
//!
//! # Layout
//!
//! ```text
//! ~/.forge/                 User scope root
//! <workspace>/.forge/       Workspace scope root
//!     settings.json         key "settings"
//!     remote/releases.json  key "remote/releases"
//! ```
//!
//! # Example
//!
//! ```no_run
//! use forgecache::cache::{CacheRoots, CacheScheme, FileCache, Scope};
//! use std::path::Path;
//!
//! let roots = CacheRoots::for_workspace(Path::new(".")).unwrap();
//! let cache = FileCache::new(roots);
//!
//! cache.write(Scope::Workspace, "builds/last", &vec![1, 2, 3]);
//! let last: Option<Vec<u32>> = cache.read(Scope::Workspace, "builds/last");
//! assert_eq!(last, Some(vec![1, 2, 3]));
//! ```

pub mod fs_ops;
pub mod record;
pub mod scope;
pub mod store;
pub mod tree;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use record::{CacheMetadata, CacheRecord, CodecError, JsonCodec, RecordCodec};
pub use scope::{normalize_key, CacheRoots, Scope, CACHE_DIR_NAME};
pub use store::{CacheScheme, ClearOutcome, FileCache};
pub use tree::ClearReport;

/// Errors raised inside the cache store.
///
/// The boolean/`Option` surface of [`CacheScheme`] never returns these; they
/// are logged there and available through the `try_*` methods of
/// [`FileCache`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// The platform did not report a home directory for the user scope.
    #[error("could not determine the home directory for the user cache")]
    NoHomeDirectory,

    /// The key would resolve outside the scope root.
    #[error("invalid cache key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// The entry or directory does not exist.
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// Access to the path was refused.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The file exists but is not a valid record.
    #[error("corrupt cache record {path}: {source}")]
    CorruptRecord {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// The payload could not be encoded.
    #[error("failed to encode record for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// Some children of a scope root could not be removed.
    #[error("cleared {removed} of {total} entries under {root}")]
    PartialClear {
        root: PathBuf,
        removed: usize,
        total: usize,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CacheError {
    /// Classify an I/O error raised while touching `path`.
    #[must_use]
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// True for errors that mean "nothing there".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::CorruptRecord { path: p, .. }
            | Self::Encode { path: p, .. }
            | Self::PartialClear { root: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            Self::NoHomeDirectory | Self::InvalidKey { .. } => None,
        }
    }
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

//! Scope and path resolution.
//!
//! Every cache operation starts here: a `(scope, key)` pair is mapped onto an
//! absolute path beneath one of the two storage roots. Resolution is pure; no
//! filesystem access happens in this module.
//!
//! # Key normalization
//!
//! - Keys are converted to Unicode NFC so that the same visual key maps to the
//!   same file on filesystems that store names decomposed (macOS).
//! - Backslash separators are rewritten to `/`.
//! - A trailing `.json` extension is enforced exactly once.
//!
//! ```
//! use forgecache::cache::scope::normalize_key;
//!
//! assert_eq!(normalize_key("settings"), "settings.json");
//! assert_eq!(normalize_key("settings.json"), "settings.json");
//! assert_eq!(normalize_key("nested/entry"), "nested/entry.json");
//! ```

use std::fmt;
use std::path::{Component, Path, PathBuf};

use clap::ValueEnum;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::{CacheError, CacheResult};

/// Directory name used for both storage roots.
pub const CACHE_DIR_NAME: &str = ".forge";

/// Extension every record file carries.
pub const RECORD_EXTENSION: &str = "json";

/// One of the two independent storage namespaces.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Machine-global cache under the user's home directory.
    User,
    /// Project-local cache inside the workspace root.
    #[default]
    Workspace,
}

impl Scope {
    /// Both scopes, user first.
    pub const ALL: [Scope; 2] = [Scope::User, Scope::Workspace];
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::User => write!(f, "user"),
            Scope::Workspace => write!(f, "workspace"),
        }
    }
}

/// The pair of root directories a store instance operates on.
///
/// Roots are fixed at construction and never change for the lifetime of the
/// store, which keeps [`CacheRoots::resolve`] deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRoots {
    user: PathBuf,
    workspace: PathBuf,
}

impl CacheRoots {
    /// Create roots from explicit directories.
    ///
    /// The paths are used as-is; `.forge` is not appended.
    #[must_use]
    pub fn new(user: impl Into<PathBuf>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            user: user.into(),
            workspace: workspace.into(),
        }
    }

    /// Standard roots: `<home>/.forge` and `<workspace_root>/.forge`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NoHomeDirectory`] if the platform cannot report a
    /// home directory for the current user.
    pub fn for_workspace(workspace_root: &Path) -> CacheResult<Self> {
        let base = BaseDirs::new().ok_or(CacheError::NoHomeDirectory)?;
        Ok(Self::new(
            base.home_dir().join(CACHE_DIR_NAME),
            workspace_root.join(CACHE_DIR_NAME),
        ))
    }

    /// Root directory for `scope`.
    #[must_use]
    pub fn root(&self, scope: Scope) -> &Path {
        match scope {
            Scope::User => &self.user,
            Scope::Workspace => &self.workspace,
        }
    }

    /// Resolve `key` within `scope` to an absolute path.
    ///
    /// `None` and empty keys resolve to the root itself. The key is not
    /// validated here; see [`validate_key`].
    #[must_use]
    pub fn resolve(&self, scope: Scope, key: Option<&str>) -> PathBuf {
        let root = self.root(scope);
        match key.map(trim_separators) {
            Some(k) if !k.is_empty() => root.join(normalize_key(k)),
            _ => root.to_path_buf(),
        }
    }
}

/// Normalize a cache key to its on-disk relative form.
///
/// Idempotent: normalizing an already-normalized key returns it unchanged.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    let mut normalized: String = trim_separators(key)
        .nfc()
        .map(|c| if c == '\\' { '/' } else { c })
        .collect();

    let suffix = format!(".{RECORD_EXTENSION}");
    if !normalized.ends_with(&suffix) {
        normalized.push_str(&suffix);
    }
    normalized
}

/// Reject keys that would resolve outside the scope root.
///
/// Absolute keys, drive prefixes and `..` components are refused. Empty keys
/// are accepted (they address the root).
///
/// # Errors
///
/// Returns [`CacheError::InvalidKey`] describing why the key was refused.
pub fn validate_key(key: &str) -> CacheResult<()> {
    let key = trim_separators(key);
    let unified = key.replace('\\', "/");
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(CacheError::InvalidKey {
                    key: key.to_string(),
                    reason: "parent directory components are not allowed",
                })
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(CacheError::InvalidKey {
                    key: key.to_string(),
                    reason: "absolute keys are not allowed",
                })
            }
        }
    }
    Ok(())
}

/// True if `key` addresses the scope root rather than an entry.
#[must_use]
pub fn is_root_key(key: &str) -> bool {
    trim_separators(key).is_empty()
}

/// Strip trailing separators so `"dir/"` does not become `"dir/.json"`.
fn trim_separators(key: &str) -> &str {
    key.trim_end_matches(['/', '\\'])
}

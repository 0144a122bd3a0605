//! Application configuration management.
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config <PATH>`, or the platform config directory)
//! 3. `FORGECACHE_*` environment variables
//! 4. CLI flags (applied by the caller via [`Config::with_overrides`])
//!
//! ```toml
//! # ~/.config/forgecache/config.toml
//! user_root = "/srv/cache/.forge"
//! pretty = false
//! atomic_writes = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheRoots, CACHE_DIR_NAME};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "FORGECACHE_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace root; the current directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
    /// Replaces `<home>/.forge` as the user scope root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_root: Option<PathBuf>,
    /// Pretty-print record files.
    pub pretty: bool,
    /// Write records through a temp file and rename.
    pub atomic_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            user_root: None,
            pretty: true,
            atomic_writes: true,
        }
    }
}

impl Config {
    /// Load the layered configuration.
    ///
    /// An explicit `path` must exist. Without one, the platform config file
    /// is used if present.
    ///
    /// # Errors
    ///
    /// Fails if the explicit file is missing or any layer holds invalid values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match path {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                log::debug!("Loading config from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => match Self::default_path() {
                Ok(default) => {
                    log::trace!("Looking for config at {}", default.display());
                    figment = figment.merge(Toml::file(default));
                }
                Err(e) => log::debug!("No platform config directory: {}", e),
            },
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .context("Invalid configuration")
    }

    /// Apply CLI flag overrides on top of the loaded layers.
    #[must_use]
    pub fn with_overrides(mut self, workspace: Option<PathBuf>, user_root: Option<PathBuf>) -> Self {
        if workspace.is_some() {
            self.workspace = workspace;
        }
        if user_root.is_some() {
            self.user_root = user_root;
        }
        self
    }

    /// Effective workspace root.
    pub fn workspace_root(&self) -> Result<PathBuf> {
        match &self.workspace {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Failed to determine current directory"),
        }
    }

    /// Storage roots derived from this configuration.
    pub fn roots(&self) -> Result<CacheRoots> {
        let workspace = self.workspace_root()?;
        let roots = match &self.user_root {
            Some(user) => CacheRoots::new(user.clone(), workspace.join(CACHE_DIR_NAME)),
            None => CacheRoots::for_workspace(&workspace)?,
        };
        Ok(roots)
    }

    /// Default platform-specific configuration path.
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("dev", "forge", "forgecache")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }
}

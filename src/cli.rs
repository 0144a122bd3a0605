//! Command-line interface definitions for forgecache.
//!
//! Global options (verbosity, color, config location, roots) apply to every
//! subcommand. Each cache subcommand takes `--scope user|workspace`,
//! defaulting to the workspace scope.
//!
//! # Example
//!
//! ```bash
//! # Store a JSON payload in the workspace cache
//! forgecache write releases/latest '{"tag": "v1.2.0"}'
//!
//! # Read it back from the user cache instead
//! forgecache read --scope user releases/latest
//!
//! # Human-readable size of the whole workspace cache
//! forgecache size
//!
//! # Remove everything from the user cache
//! forgecache clear --scope user --yes
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::cache::Scope;

/// Scoped, file-backed JSON cache.
///
/// Entries live under `~/.forge` (user scope) or `<workspace>/.forge`
/// (workspace scope), one pretty-printed JSON record per key.
#[derive(Debug, Parser)]
#[command(name = "forgecache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (any non-empty `NO_COLOR` other than `0`/`false` counts)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML) to load instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Workspace root; the workspace cache lives in `<PATH>/.forge`
    #[arg(short, long, global = true, value_name = "PATH")]
    pub workspace: Option<PathBuf>,

    /// Override the user cache root (default: `~/.forge`)
    #[arg(long, global = true, value_name = "PATH")]
    pub user_root: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Store a JSON payload under a key
    Write(WriteArgs),
    /// Print the payload stored under a key
    Read(KeyArgs),
    /// Check whether a key (or the scope root) exists
    Exists(OptionalKeyArgs),
    /// List every key in a scope
    List(ScopeArgs),
    /// Size of one entry, or of the whole scope
    Size(SizeArgs),
    /// Print the createdAt/updatedAt timestamps of a key
    Metadata(KeyArgs),
    /// Remove one entry, or the whole scope with --yes
    Clear(ClearArgs),
    /// Show the resolved cache roots
    Roots,
    /// Entry count and total size of both scopes
    Stats(StatsArgs),
}

/// Scope selector shared by cache subcommands.
#[derive(Debug, Clone, Copy, Args)]
pub struct ScopeArgs {
    /// Cache scope to operate on
    #[arg(short, long, value_enum, default_value = "workspace")]
    pub scope: Scope,
}

/// A required key within a scope.
#[derive(Debug, Args)]
pub struct KeyArgs {
    /// Cache key; `.json` is appended when missing
    #[arg(value_name = "KEY")]
    pub key: String,

    #[command(flatten)]
    pub scope: ScopeArgs,
}

/// An optional key; without one the scope root is addressed.
#[derive(Debug, Args)]
pub struct OptionalKeyArgs {
    /// Cache key; omit to address the scope root
    #[arg(value_name = "KEY")]
    pub key: Option<String>,

    #[command(flatten)]
    pub scope: ScopeArgs,
}

/// Arguments for the write subcommand.
#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Cache key; `.json` is appended when missing
    #[arg(value_name = "KEY")]
    pub key: String,

    /// JSON payload, or `-` to read it from stdin
    #[arg(value_name = "JSON")]
    pub payload: String,

    #[command(flatten)]
    pub scope: ScopeArgs,
}

/// Arguments for the size subcommand.
#[derive(Debug, Args)]
pub struct SizeArgs {
    /// Cache key (`.json` is appended, like every key); omit for the whole scope
    #[arg(value_name = "KEY")]
    pub key: Option<String>,

    /// Print the raw byte count instead of a human-readable size
    #[arg(long)]
    pub bytes: bool,

    #[command(flatten)]
    pub scope: ScopeArgs,
}

/// Arguments for the clear subcommand.
#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Entry to remove; omit to clear the whole scope
    #[arg(value_name = "KEY")]
    pub key: Option<String>,

    /// Confirm clearing the whole scope
    #[arg(short = 'y', long)]
    pub yes: bool,

    #[command(flatten)]
    pub scope: ScopeArgs,
}

/// Arguments for the stats subcommand.
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Print raw byte counts instead of human-readable sizes
    #[arg(long)]
    pub bytes: bool,
}

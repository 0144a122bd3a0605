//! forgecache - Scoped, file-backed JSON cache
//!
//! A small persistent key-value store with two tiers: a machine-global
//! **user** cache under `~/.forge` and a project-local **workspace** cache
//! under `<workspace>/.forge`. Each key maps to one pretty-printed JSON
//! record carrying `createdAt`/`updatedAt` provenance.

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

use anyhow::Result;

use crate::cache::FileCache;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::ExitCode;

/// Run the application with parsed CLI arguments.
///
/// Initializes logging and color handling (styled only on a terminal), loads the layered configuration,
/// builds the store and executes the subcommand, printing to stdout.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    yansi::whenever(yansi::Condition::TTY_AND_COLOR);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref())?
        .with_overrides(cli.workspace.clone(), cli.user_root.clone());
    let cache = FileCache::from_config(&config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::execute(&cache, &cli.command, &mut out)
}

//! Logging setup for forgecache.
//!
//! The `log` facade with an `env_logger` backend, always writing to stderr
//! so stdout stays reserved for command output.
//!
//! The filter comes from one of two places:
//!
//! - `RUST_LOG`, when set and non-empty, is used verbatim.
//! - Otherwise `-q`/`-v` pick the level for forgecache's own modules, and
//!   every other crate is capped at `warn`.
//!
//! With `-v` each line also names the emitting module, relative to the
//! crate (`[cache::store]`). Debug builds prefix a timestamp.
//!
//! ```rust,no_run
//! use forgecache::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("Cache roots resolved");
//! ```

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::io::Write;

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Ceiling for log output from dependencies when driven by CLI flags.
const DEPENDENCY_CEILING: LevelFilter = LevelFilter::Warn;

#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterSource {
    /// Raw `RUST_LOG` directives.
    Directives(String),
    /// Level for this crate, from `-v`/`-q`.
    Flags(LevelFilter),
}

/// Install the global logger.
///
/// Only the first call in a process takes effect; later calls keep the
/// logger that is already installed.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();
    builder.target(Target::Stderr);

    match filter_source(std::env::var("RUST_LOG").ok(), verbose, quiet) {
        FilterSource::Directives(directives) => {
            builder.parse_filters(&directives);
        }
        FilterSource::Flags(own) => {
            builder
                .filter_level(own.min(DEPENDENCY_CEILING))
                .filter_module(CRATE_TARGET, own);
        }
    }

    let show_module = verbose >= 1;
    builder.format(move |buf, record| {
        if cfg!(debug_assertions) {
            let timestamp = buf.timestamp_seconds();
            write!(buf, "{timestamp} ")?;
        }
        let level = record.level();
        let style = buf.default_level_style(level);
        write!(buf, "{style}{level:<5}{style:#} ")?;
        if show_module {
            write!(buf, "[{}] ", module_label(record.target()))?;
        }
        writeln!(buf, "{}", record.args())
    });

    if builder.try_init().is_err() {
        log::debug!("Logger already installed");
    }
}

fn filter_source(rust_log: Option<String>, verbose: u8, quiet: bool) -> FilterSource {
    match rust_log.filter(|directives| !directives.trim().is_empty()) {
        Some(directives) => FilterSource::Directives(directives),
        None => FilterSource::Flags(flag_level(verbose, quiet)),
    }
}

/// `quiet` wins over `verbose`.
fn flag_level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// `forgecache::cache::store` -> `cache::store`; foreign targets unchanged.
fn module_label(target: &str) -> &str {
    target
        .strip_prefix(CRATE_TARGET)
        .and_then(|rest| rest.strip_prefix("::"))
        .unwrap_or(target)
}

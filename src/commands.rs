//! Subcommand execution.
//!
//! Each handler writes its result to `out` and returns the exit code to use.
//! Failures are returned as `anyhow` errors with context; the caller maps
//! them to exit codes via [`ExitCode::for_error`].

use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use bytesize::ByteSize;
use serde_json::Value;
use yansi::Paint;

use crate::cache::{CacheScheme, FileCache, Scope};
use crate::cli::{ClearArgs, Commands, KeyArgs, OptionalKeyArgs, SizeArgs, StatsArgs, WriteArgs};
use crate::error::ExitCode;

/// Run `command` against `cache`, writing results to `out`.
pub fn execute(cache: &FileCache, command: &Commands, out: &mut dyn Write) -> Result<ExitCode> {
    match command {
        Commands::Write(args) => write(cache, args, out),
        Commands::Read(args) => read(cache, args, out),
        Commands::Exists(args) => exists(cache, args, out),
        Commands::List(args) => {
            for key in cache.list(args.scope) {
                writeln!(out, "{key}")?;
            }
            Ok(ExitCode::Success)
        }
        Commands::Size(args) => size(cache, args, out),
        Commands::Metadata(args) => metadata(cache, args, out),
        Commands::Clear(args) => clear(cache, args, out),
        Commands::Roots => {
            for scope in Scope::ALL {
                let root = cache.resolve_path(scope, None);
                writeln!(out, "{:<10} {}", scope.bold(), root.display())?;
            }
            Ok(ExitCode::Success)
        }
        Commands::Stats(args) => stats(cache, args, out),
    }
}

fn write(cache: &FileCache, args: &WriteArgs, out: &mut dyn Write) -> Result<ExitCode> {
    let text = if args.payload == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read payload from stdin")?;
        buf
    } else {
        args.payload.clone()
    };

    let payload: Value = serde_json::from_str(&text).context("Payload is not valid JSON")?;
    let path = cache
        .try_write(args.scope.scope, &args.key, &payload)
        .with_context(|| format!("Failed to write '{}'", args.key))?;

    writeln!(out, "{} {}", "wrote".green(), path.display())?;
    Ok(ExitCode::Success)
}

fn read(cache: &FileCache, args: &KeyArgs, out: &mut dyn Write) -> Result<ExitCode> {
    let payload: Value = cache
        .try_read(args.scope.scope, &args.key)
        .with_context(|| format!("Failed to read '{}'", args.key))?;
    writeln!(out, "{}", serde_json::to_string_pretty(&payload)?)?;
    Ok(ExitCode::Success)
}

fn exists(cache: &FileCache, args: &OptionalKeyArgs, out: &mut dyn Write) -> Result<ExitCode> {
    let found = cache.exists(args.scope.scope, args.key.as_deref());
    writeln!(out, "{found}")?;
    Ok(if found {
        ExitCode::Success
    } else {
        ExitCode::NotFound
    })
}

fn size(cache: &FileCache, args: &SizeArgs, out: &mut dyn Write) -> Result<ExitCode> {
    let bytes = cache.size(args.scope.scope, args.key.as_deref());
    writeln!(out, "{}", format_size(bytes, args.bytes))?;
    Ok(ExitCode::Success)
}

fn metadata(cache: &FileCache, args: &KeyArgs, out: &mut dyn Write) -> Result<ExitCode> {
    let meta = cache
        .try_metadata(args.scope.scope, &args.key)
        .with_context(|| format!("Failed to read metadata for '{}'", args.key))?;
    writeln!(out, "{}", serde_json::to_string_pretty(&meta)?)?;
    Ok(ExitCode::Success)
}

fn clear(cache: &FileCache, args: &ClearArgs, out: &mut dyn Write) -> Result<ExitCode> {
    let scope = args.scope.scope;
    match args.key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => {
            let payload: Option<Value> = cache
                .try_clear_entry(scope, key)
                .with_context(|| format!("Failed to clear '{key}'"))?;
            writeln!(out, "{} {}", "removed".yellow(), key)?;
            if let Some(payload) = payload {
                writeln!(out, "{}", serde_json::to_string_pretty(&payload)?)?;
            }
            Ok(ExitCode::Success)
        }
        None => {
            if !args.yes {
                log::error!("Refusing to clear the whole {scope} cache without --yes");
                return Ok(ExitCode::InvalidInput);
            }
            let report = cache
                .try_clear_scope(scope)
                .with_context(|| format!("Failed to clear the {scope} cache"))?;
            writeln!(
                out,
                "{} {} entries from the {} cache",
                "cleared".yellow(),
                report.removed.len(),
                scope
            )?;
            Ok(ExitCode::Success)
        }
    }
}

fn stats(cache: &FileCache, args: &StatsArgs, out: &mut dyn Write) -> Result<ExitCode> {
    for scope in Scope::ALL {
        let entries = if cache.exists(scope, None) {
            cache.list(scope).len()
        } else {
            0
        };
        let total = cache.size(scope, None);
        writeln!(
            out,
            "{:<10} {:>6} entries  {}",
            scope.bold(),
            entries,
            format_size(total, args.bytes)
        )?;
    }
    Ok(ExitCode::Success)
}

fn format_size(bytes: u64, raw: bool) -> String {
    if raw {
        bytes.to_string()
    } else {
        ByteSize::b(bytes).to_string()
    }
}

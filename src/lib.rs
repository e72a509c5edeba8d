//! DupeMirror - content-addressed duplicate finder and mirror.
//!
//! Walks a directory tree, fingerprints each matching file, records the first
//! path seen for every fingerprint in a persistent SQLite index, and either
//! reports new and duplicate files or mirrors the first-seen files into a
//! destination tree that reproduces their absolute paths.
//!
//! The pieces compose through small seams:
//!
//! - [`scanner::Walker`] yields candidate paths
//! - [`fingerprint::Fingerprinter`] turns a path into a [`fingerprint::ContentKey`]
//! - [`index::ContentIndex`] enforces one entry per key
//! - [`mirror::mirror`] copies first-seen files
//! - [`engine::Engine`] drives them and reports [`engine::ScanEvent`]s

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod index;
pub mod logging;
pub mod mirror;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{IsTerminal, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::{Cli, Commands, HashArgs, IndexArgs, ScanArgs};
use crate::config::Config;
use crate::engine::{Engine, ScanOptions};
use crate::error::ExitCode;
use crate::index::{ContentIndex, SqliteIndex};
use crate::output::{OutputFormat, Reporter};
use crate::progress::ProgressSink;

/// Run the application for parsed CLI arguments.
///
/// # Errors
///
/// Returns an error for fatal failures: bad configuration, an unwalkable
/// root, or a failing index. Per-file problems are not errors; they are
/// reflected in the returned [`ExitCode`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let color = !cli.no_color && std::io::stdout().is_terminal();

    match &cli.command {
        Commands::Scan(args) => run_scan(args, config, color, cli.quiet),
        Commands::Hash(args) => run_hash(args, &config),
        Commands::Index(args) => run_index(args, &config),
    }
}

fn run_scan(args: &ScanArgs, mut config: Config, color: bool, quiet: bool) -> Result<ExitCode> {
    config.merge_cli(args);
    log::debug!("Effective configuration: {config:?}");

    let mut options = ScanOptions::new(args.path.clone()).with_commit(config.commit_policy());
    if let Some(destination) = &config.destination {
        options = options.with_destination(destination.clone());
    }

    let fingerprinter = config.strategy.build();
    let handler = signal::install_handler()?;
    let engine = Engine::new(options, config.walker_config(), fingerprinter.as_ref())?
        .with_shutdown_flag(handler.get_flag());

    let index = index::open(config.index_location())?;

    let reporter = Reporter::new(config.output, std::io::stdout(), color);
    let mut sink = ProgressSink::new(reporter, quiet);
    let result = engine.run(index, &mut sink);
    let mut reporter = sink.finish();

    let summary = result?;
    reporter.write_summary(&summary);
    reporter.into_inner().flush()?;

    Ok(ExitCode::from_summary(&summary))
}

fn run_hash(args: &HashArgs, config: &Config) -> Result<ExitCode> {
    let strategy = args.strategy.unwrap_or(config.strategy);
    let fingerprinter = strategy.build();

    let mut stdout = std::io::stdout().lock();
    let mut failures = 0usize;
    for file in &args.files {
        match fingerprinter.fingerprint(file) {
            Ok(key) => writeln!(stdout, "hash: {} path: {}", key, file.display())?,
            Err(e) => {
                failures += 1;
                log::error!("{e}");
            }
        }
    }
    stdout.flush()?;

    if failures == args.files.len() {
        bail!("No file could be fingerprinted with {strategy}");
    }
    Ok(if failures > 0 {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    })
}

fn run_index(args: &IndexArgs, config: &Config) -> Result<ExitCode> {
    let location = args.index.as_deref().unwrap_or_else(|| config.stored_index());
    if !location.is_file() {
        bail!("No index at {}", location.display());
    }

    let index = SqliteIndex::open(location)?;
    let entries = index.entries()?;
    write_entries(location, &entries, args.output.unwrap_or(config.output))?;
    Box::new(index).close()?;

    Ok(ExitCode::Success)
}

fn write_entries(
    location: &Path,
    entries: &[index::IndexEntry],
    format: OutputFormat,
) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Text => {
            for entry in entries {
                let path = entry
                    .path
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |p| p.display().to_string());
                writeln!(stdout, "hash: {} path: {}", entry.key, path)?;
            }
            log::info!("{} entries in {}", entries.len(), location.display());
        }
        OutputFormat::Json => {
            for entry in entries {
                serde_json::to_writer(&mut stdout, entry)?;
                writeln!(stdout)?;
            }
        }
    }
    stdout.flush()?;
    Ok(())
}

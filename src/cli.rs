//! Command-line interface definitions for DupeMirror.
//!
//! Global options (verbosity, color, error format, config file) apply to every
//! subcommand. Scan options left unset fall back to the config file and
//! `DUPEMIRROR_*` environment variables.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates under ~/Pictures, nothing persisted
//! dupemirror scan ~/Pictures
//!
//! # Report and remember first-seen files across runs
//! dupemirror scan ~/Pictures --index photos.db
//!
//! # Mirror unique images into /mnt/backup (index in .hashed_file.db)
//! dupemirror scan ~/Pictures --destination /mnt/backup
//!
//! # Fingerprint single files
//! dupemirror hash a.jpg b.jpg --strategy ahash
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::fingerprint::Strategy;
use crate::output::OutputFormat;

/// Content-addressed duplicate finder and mirror.
///
/// DupeMirror walks a tree, fingerprints every matching file, records the
/// first path seen for each fingerprint in a persistent index, and reports
/// or mirrors the first-seen files.
#[derive(Debug, Parser)]
#[command(name = "dupemirror")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Read settings from this TOML file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Walk a tree and report or mirror unique files
    Scan(ScanArgs),
    /// Print the fingerprint of individual files
    Hash(HashArgs),
    /// List the entries of a persistent index
    Index(IndexArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory or single file to scan
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// File-name extension to select, case-insensitive ("*" for all files)
    #[arg(short, long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Mirror first-seen files under this directory
    #[arg(short, long, value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Path to the persistent index database
    ///
    /// Defaults to .hashed_file.db when mirroring. Without it, report mode
    /// tracks duplicates for this run only.
    #[arg(long, value_name = "PATH")]
    pub index: Option<PathBuf>,

    /// Track duplicates for this run only, without a database
    #[arg(long, conflicts_with = "index")]
    pub no_index: bool,

    /// Fingerprinting strategy
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,

    /// New entries between index commits (0 = once at the end)
    #[arg(long, value_name = "N")]
    pub commit_every: Option<usize>,

    /// Do not descend into hidden directories
    #[arg(long)]
    pub skip_hidden_dirs: bool,

    /// Follow symbolic links during scan
    ///
    /// Warning: May cause infinite loops if symlinks form cycles.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Output format on stdout
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

/// Arguments for the hash subcommand.
#[derive(Debug, Args)]
pub struct HashArgs {
    /// Files to fingerprint
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Fingerprinting strategy
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,
}

/// Arguments for the index subcommand.
#[derive(Debug, Args)]
pub struct IndexArgs {
    /// Path to the persistent index database [default: .hashed_file.db]
    #[arg(long, value_name = "PATH")]
    pub index: Option<PathBuf>,

    /// Output format on stdout
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

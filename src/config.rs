//! Layered application configuration.
//!
//! Values are resolved in increasing priority:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML file (`--config PATH`, or `config.toml` in the platform config dir)
//! 3. `DUPEMIRROR_*` environment variables (e.g. `DUPEMIRROR_EXTENSION=png`)
//! 4. Command-line flags ([`Config::merge_cli`])
//!
//! ```toml
//! extension = "jpg"
//! strategy = "ahash"
//! index = "/var/lib/dupemirror/photos.db"
//! destination = "/mnt/backup"
//! commit_every = 100
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::ScanArgs;
use crate::fingerprint::Strategy;
use crate::index::CommitPolicy;
use crate::output::OutputFormat;
use crate::scanner::{ExtensionFilter, WalkerConfig};

/// Index used in copy mode when none is configured, relative to the working
/// directory.
pub const DEFAULT_INDEX_FILE: &str = ".hashed_file.db";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DUPEMIRROR_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File-name suffix to select; empty or `*` selects everything.
    pub extension: String,
    /// Fingerprinting strategy.
    pub strategy: Strategy,
    /// Persistent index location. Without one, report mode keeps duplicates
    /// in memory and copy mode uses [`DEFAULT_INDEX_FILE`].
    pub index: Option<PathBuf>,
    /// Keep the index in memory only, for print-only runs.
    pub no_index: bool,
    /// Mirror first-seen files under this directory.
    pub destination: Option<PathBuf>,
    /// New entries between index commits; 0 commits once at the end.
    pub commit_every: usize,
    /// Do not descend into directories whose name starts with `.`.
    pub skip_hidden_dirs: bool,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Result format on stdout.
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extension: "jpg".to_string(),
            strategy: Strategy::default(),
            index: None,
            no_index: false,
            destination: None,
            commit_every: CommitPolicy::default().every,
            skip_hidden_dirs: false,
            follow_symlinks: false,
            output: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from `explicit`, or from the default config file
    /// when none is given. A missing default file is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if a file or variable cannot be parsed,
    /// or if an explicitly named file does not exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, figment::Error> {
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(figment::Error::from(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::load_from_path(path)
            }
            None => match Self::default_path() {
                Some(path) => Self::load_from_path(&path),
                None => Self::figment(None).extract(),
            },
        }
    }

    /// Load configuration from a specific TOML file plus the environment.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] on malformed TOML or bad values.
    pub fn load_from_path(path: &Path) -> Result<Self, figment::Error> {
        log::debug!("Loading configuration from {}", path.display());
        Self::figment(Some(path)).extract()
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Platform-specific default config file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupemirror", "dupemirror")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply the flags given for the `scan` command on top of file and
    /// environment settings.
    pub fn merge_cli(&mut self, args: &ScanArgs) {
        if let Some(extension) = &args.extension {
            self.extension.clone_from(extension);
        }
        if let Some(strategy) = args.strategy {
            self.strategy = strategy;
        }
        if let Some(index) = &args.index {
            self.index = Some(index.clone());
            self.no_index = false;
        }
        if args.no_index {
            self.no_index = true;
        }
        if let Some(destination) = &args.destination {
            self.destination = Some(destination.clone());
        }
        if let Some(every) = args.commit_every {
            self.commit_every = every;
        }
        if args.skip_hidden_dirs {
            self.skip_hidden_dirs = true;
        }
        if args.follow_symlinks {
            self.follow_symlinks = true;
        }
        if let Some(output) = args.output {
            self.output = output;
        }
    }

    /// Walker settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            extension: ExtensionFilter::new(&self.extension),
            skip_hidden_dirs: self.skip_hidden_dirs,
            follow_symlinks: self.follow_symlinks,
        }
    }

    /// Commit policy derived from `commit_every`.
    #[must_use]
    pub fn commit_policy(&self) -> CommitPolicy {
        CommitPolicy {
            every: self.commit_every,
        }
    }

    /// Index location for a scan, or `None` for a transient index.
    #[must_use]
    pub fn index_location(&self) -> Option<&Path> {
        if self.no_index {
            return None;
        }
        match (&self.index, &self.destination) {
            (Some(index), _) => Some(index.as_path()),
            (None, Some(_)) => Some(Path::new(DEFAULT_INDEX_FILE)),
            (None, None) => None,
        }
    }

    /// Index read by the `index` command.
    #[must_use]
    pub fn stored_index(&self) -> &Path {
        self.index
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_INDEX_FILE))
    }
}

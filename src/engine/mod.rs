//! Scan orchestration.
//!
//! The [`Engine`] drives one pass over a tree:
//!
//! ```text
//! walk -> fingerprint -> index.insert -> { duplicate | new [-> mirror] } -> commit -> close
//! ```
//!
//! Per-item failures (unreadable subentries, unreadable files, failed copies)
//! are reported as [`ScanEvent::Warning`] and the walk continues. Only an
//! unusable root or a store failure ends the run early. Whatever happens, the
//! index is committed and then closed before [`Engine::run`] returns.
//!
//! A failed copy does not undo the insert: the content counts as seen even
//! though no mirror exists for it.

pub mod events;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::fingerprint::Fingerprinter;
use crate::index::{CommitPolicy, ContentIndex, InsertOutcome, StoreError};
use crate::mirror::mirror;
use crate::scanner::{ScanError, Walker, WalkerConfig};

pub use events::{EventSink, NullSink, ScanEvent, ScanSummary, WarningKind};

/// What to scan and where to mirror.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Directory or single file to scan
    pub root: PathBuf,
    /// Mirror first-seen files here; `None` is report mode
    pub destination: Option<PathBuf>,
    /// How often the index is committed
    pub commit: CommitPolicy,
}

impl ScanOptions {
    /// Report-mode options for `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            destination: None,
            commit: CommitPolicy::default(),
        }
    }

    /// Enable copy mode.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Set the commit policy.
    #[must_use]
    pub fn with_commit(mut self, commit: CommitPolicy) -> Self {
        self.commit = commit;
        self
    }

    /// Check the options before any work starts.
    ///
    /// A destination that does not exist yet is fine; it is created on the
    /// first copy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a missing root or a destination that
    /// exists but is not a directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.root.exists() {
            return Err(ConfigError::RootNotFound(self.root.clone()));
        }
        if let Some(destination) = &self.destination {
            if destination.exists() && !destination.is_dir() {
                return Err(ConfigError::DestinationNotDirectory(destination.clone()));
            }
            if let (Ok(root), Ok(dest)) = (self.root.canonicalize(), destination.canonicalize()) {
                if dest.starts_with(&root) {
                    log::warn!(
                        "Destination {} is inside the scanned tree; mirrored files will be walked as duplicates",
                        destination.display()
                    );
                }
            }
        }
        Ok(())
    }
}

/// Invalid scan configuration, detected before any work.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The root path does not exist.
    #[error("Scan root not found: {0}")]
    RootNotFound(PathBuf),

    /// The destination exists but is a file.
    #[error("Destination is not a directory: {0}")]
    DestinationNotDirectory(PathBuf),
}

/// Fatal errors that end a run.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// The options were rejected before the run.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The root could not be traversed.
    #[error("Cannot walk scan root: {0}")]
    Traversal(#[from] ScanError),

    /// The index failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Composes walker, fingerprinter, index and mirror copier.
pub struct Engine<'a> {
    options: ScanOptions,
    walker_config: WalkerConfig,
    fingerprinter: &'a dyn Fingerprinter,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl<'a> Engine<'a> {
    /// Create an engine after validating `options`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the options are unusable.
    pub fn new(
        options: ScanOptions,
        walker_config: WalkerConfig,
        fingerprinter: &'a dyn Fingerprinter,
    ) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            options,
            walker_config,
            fingerprinter,
            shutdown_flag: None,
        })
    }

    /// Stop between candidates once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The options this engine runs with.
    #[must_use]
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Run one scan, taking ownership of the index.
    ///
    /// The index is committed and closed on every path out of this function,
    /// including fatal errors. When several steps fail, the first error is
    /// returned and later ones are logged.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the root cannot be walked or the index
    /// fails to insert, commit or close.
    pub fn run(
        &self,
        mut index: Box<dyn ContentIndex>,
        sink: &mut dyn EventSink,
    ) -> Result<ScanSummary, EngineError> {
        let started = Instant::now();
        let mut summary = ScanSummary::default();

        log::info!(
            "Scanning {} ({} fingerprints, {})",
            self.options.root.display(),
            self.fingerprinter.name(),
            self.options
                .destination
                .as_ref()
                .map_or_else(|| "report mode".to_string(), |d| format!("mirroring to {}", d.display()))
        );

        let walked = self.process(index.as_mut(), sink, &mut summary);
        let committed = index.commit().map_err(EngineError::from);
        let closed = index.close().map_err(EngineError::from);

        summary.duration = started.elapsed();

        let mut first_error = None;
        for result in [walked, committed, closed] {
            if let Err(e) = result {
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    log::error!("{e}");
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        log::info!(
            "Scan finished: {} candidates, {} new, {} duplicates, {} copied, {} warnings",
            summary.candidates,
            summary.new,
            summary.duplicates,
            summary.copied,
            summary.warnings()
        );
        Ok(summary)
    }

    fn process(
        &self,
        index: &mut dyn ContentIndex,
        sink: &mut dyn EventSink,
        summary: &mut ScanSummary,
    ) -> Result<(), EngineError> {
        let mut walker = Walker::new(&self.options.root, self.walker_config.clone());
        if let Some(flag) = &self.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut pending = 0usize;
        let mut interrupted = false;
        for item in walker.walk()? {
            if self.is_shutdown_requested() {
                log::info!("Shutdown requested, stopping scan");
                interrupted = true;
                break;
            }

            let path = match item {
                Ok(path) => path,
                Err(e) => {
                    summary.walk_errors += 1;
                    let path = scan_error_path(&e).to_path_buf();
                    warn(sink, WarningKind::Walk, path, e.to_string());
                    continue;
                }
            };
            summary.candidates += 1;

            let key = match self.fingerprinter.fingerprint(&path) {
                Ok(key) => key,
                Err(e) => {
                    summary.fingerprint_errors += 1;
                    warn(sink, WarningKind::Fingerprint, path, e.to_string());
                    continue;
                }
            };

            match index.insert(&key, &path)? {
                InsertOutcome::Duplicate { first_seen } => {
                    summary.duplicates += 1;
                    log::debug!("Duplicate {}: {}", key, path.display());
                    sink.emit(&ScanEvent::Duplicate {
                        key,
                        path,
                        first_seen,
                    });
                }
                InsertOutcome::Inserted => {
                    summary.new += 1;
                    pending += 1;
                    sink.emit(&ScanEvent::New {
                        key,
                        path: path.clone(),
                    });

                    if let Some(destination) = &self.options.destination {
                        self.copy(&path, destination, sink, summary);
                    }

                    if self.options.commit.is_due(pending) {
                        index.commit()?;
                        pending = 0;
                    }
                }
            }
        }

        summary.interrupted = interrupted || walker.was_stopped();
        Ok(())
    }

    fn copy(
        &self,
        source: &Path,
        destination: &Path,
        sink: &mut dyn EventSink,
        summary: &mut ScanSummary,
    ) {
        match mirror(source, destination) {
            Ok(outcome) => {
                summary.copied += 1;
                summary.bytes_copied += outcome.bytes;
                sink.emit(&ScanEvent::Copied {
                    source: source.to_path_buf(),
                    target: outcome.target,
                    bytes: outcome.bytes,
                });
            }
            Err(e) => {
                summary.copy_errors += 1;
                warn(sink, WarningKind::Copy, source.to_path_buf(), e.to_string());
            }
        }
    }
}

fn warn(sink: &mut dyn EventSink, kind: WarningKind, path: PathBuf, message: String) {
    log::warn!("{message}");
    sink.emit(&ScanEvent::Warning {
        kind,
        path,
        message,
    });
}

fn scan_error_path(error: &ScanError) -> &Path {
    match error {
        ScanError::PermissionDenied(path) | ScanError::NotFound(path) => path.as_path(),
        ScanError::Io { path, .. } => path.as_path(),
    }
}

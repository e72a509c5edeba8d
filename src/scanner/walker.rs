//! Directory walker implementation using jwalk.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for lazily traversing a
//! directory tree and yielding candidate file paths for fingerprinting.
//!
//! # Features
//!
//! - Children sorted by name, so each directory is read in a stable order
//! - Hidden files (`.name`) always skipped, hidden directories optionally
//! - Case-insensitive extension filtering via [`ExtensionFilter`]
//! - Unreadable subentries reported as errors without aborting the walk
//! - Graceful shutdown via atomic flag
//!
//! [`ExtensionFilter`]: super::ExtensionFilter

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{ScanError, WalkerConfig};

/// Boxed stream of walk results.
pub type WalkIter<'a> = Box<dyn Iterator<Item = Result<PathBuf, ScanError>> + 'a>;

/// Lazy, single-pass file discovery.
///
/// Each call to [`Walker::walk`] starts a fresh traversal from the root.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Set when the last walk ended on the shutdown flag
    stopped: Cell<bool>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            stopped: Cell::new(false),
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Whether the last walk left entries unvisited because of the shutdown flag.
    #[must_use]
    pub fn was_stopped(&self) -> bool {
        self.stopped.get()
    }

    /// Whether a file name passes the hidden-file and extension filters.
    fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };
        if is_hidden(&name) {
            log::trace!("Skipping hidden file: {}", path.display());
            return false;
        }
        self.config.extension.matches(&name)
    }

    /// Resolve the root to an absolute, normalized path.
    fn resolve_root(&self) -> Result<PathBuf, ScanError> {
        std::fs::canonicalize(&self.root).map_err(|e| classify_io(&self.root, e))
    }

    /// Walk the tree, yielding candidate file paths.
    ///
    /// A root that is a regular file yields at most itself.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the root does not exist or cannot be read.
    /// Subentry failures are yielded as `Err` items and do not end the walk.
    pub fn walk(&self) -> Result<WalkIter<'_>, ScanError> {
        self.stopped.set(false);
        let root = self.resolve_root()?;
        let metadata = std::fs::metadata(&root).map_err(|e| classify_io(&root, e))?;

        if metadata.is_file() {
            let single = self.accepts(&root).then_some(Ok(root));
            return Ok(Box::new(single.into_iter()));
        }

        // Fail fast on an unreadable root, before any candidate is produced.
        std::fs::read_dir(&root).map_err(|e| classify_io(&root, e))?;

        let skip_hidden_dirs = self.config.skip_hidden_dirs;
        let walk_dir = WalkDir::new(&root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(false)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                if skip_hidden_dirs {
                    children.retain(|child| match child {
                        Ok(entry) => {
                            !(entry.file_type().is_dir()
                                && is_hidden(&entry.file_name().to_string_lossy()))
                        }
                        Err(_) => true,
                    });
                }
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        let iter = walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                if !self.stopped.replace(true) {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                }
                return None;
            }

            match entry_result {
                Ok(entry) => {
                    if entry.depth == 0 {
                        return None;
                    }

                    let path = entry.path();
                    let file_type = entry.file_type();

                    if file_type.is_dir() {
                        return entry
                            .read_children_error
                            .as_ref()
                            .map(|e| Err(walk_error(path.clone(), e)));
                    }

                    if file_type.is_symlink() && !self.config.follow_symlinks {
                        log::trace!("Skipping symlink: {}", path.display());
                        return None;
                    }

                    if !self.accepts(&path) {
                        return None;
                    }

                    // Skip sockets, fifos and devices.
                    match std::fs::metadata(&path) {
                        Ok(m) if m.is_file() => Some(Ok(path)),
                        Ok(_) => None,
                        Err(e) => {
                            log::warn!("Cannot stat {}: {}", path.display(), e);
                            Some(Err(classify_io(&path, e)))
                        }
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| root.clone(), std::borrow::ToOwned::to_owned);
                    Some(Err(walk_error(path, &e)))
                }
            }
        });

        Ok(Box::new(iter))
    }
}

/// Names starting with `.` are hidden.
fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Map an I/O error to a [`ScanError`] by kind.
fn classify_io(path: &Path, error: std::io::Error) -> ScanError {
    use std::io::ErrorKind;

    match error.kind() {
        ErrorKind::NotFound => ScanError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => ScanError::PermissionDenied(path.to_path_buf()),
        _ => ScanError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}

/// Convert a jwalk error, keeping the I/O kind when there is one.
fn walk_error(path: PathBuf, error: &jwalk::Error) -> ScanError {
    log::warn!("Walker error for {}: {}", path.display(), error);
    match error.io_error().map(std::io::Error::kind) {
        Some(std::io::ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
        Some(std::io::ErrorKind::NotFound) => ScanError::NotFound(path),
        _ => ScanError::Io {
            path,
            source: std::io::Error::other(error.to_string()),
        },
    }
}

//! Uniqueness index for content keys.
//!
//! The index maps each [`ContentKey`] to the path of the first file seen with
//! that content. A key is inserted at most once: inserting a key that is
//! already present is a normal [`InsertOutcome::Duplicate`], never an error.
//! Genuine storage problems travel on the separate [`StoreError`] channel.
//!
//! # Architecture
//!
//! * [`sqlite`]: persistent store in a single SQLite file, survives restarts.
//! * [`memory`]: transient store for print-only runs, same semantics.
//!
//! Both implement [`ContentIndex`], which the engine consumes as a trait
//! object and closes exactly once through [`ContentIndex::close`].

pub mod memory;
pub mod sqlite;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::fingerprint::ContentKey;

pub use memory::MemoryIndex;
pub use sqlite::{IndexEntry, SqliteIndex};

/// Result of an insert attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The key was new; the path is now its first-seen path.
    Inserted,
    /// The key already existed; the store is unchanged.
    Duplicate {
        /// Path recorded for the key, when the backend can report it.
        first_seen: Option<PathBuf>,
    },
}

impl InsertOutcome {
    /// `true` when the insert recorded novel content.
    #[must_use]
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted)
    }
}

/// Errors raised by an index backend. All of them are fatal to a run.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The store could not be opened or created.
    #[error("Failed to open index at {path}: {source}")]
    Open {
        /// Location of the store
        path: PathBuf,
        /// Underlying database error
        #[source]
        source: rusqlite::Error,
    },

    /// The parent directory of the store could not be created.
    #[error("Failed to create index directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A query against an open store failed.
    #[error("Index query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// The store refused a row for a key it does not hold.
    #[error("Index rejected the entry for {0} without holding it")]
    MissingKey(ContentKey),

    /// Closing the store failed.
    #[error("Failed to close index: {0}")]
    Close(#[source] rusqlite::Error),
}

/// When the engine asks the index to commit.
///
/// `every` counts inserted entries: `1` commits after each new file,
/// `0` commits only once at the end of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPolicy {
    /// Inserted entries between commits; 0 means end of run only.
    pub every: usize,
}

impl CommitPolicy {
    /// Commit after every inserted entry.
    #[must_use]
    pub fn per_file() -> Self {
        Self { every: 1 }
    }

    /// Commit once, after the walk.
    #[must_use]
    pub fn per_run() -> Self {
        Self { every: 0 }
    }

    /// Whether a commit is due after `pending` uncommitted inserts.
    #[must_use]
    pub fn is_due(&self, pending: usize) -> bool {
        self.every > 0 && pending >= self.every
    }
}

impl Default for CommitPolicy {
    fn default() -> Self {
        Self::per_file()
    }
}

/// A keyed store enforcing one entry per content key.
pub trait ContentIndex {
    /// Record `path` as the first-seen file for `key` unless the key exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only on backend failure; duplicates are
    /// reported through [`InsertOutcome::Duplicate`].
    fn insert(&mut self, key: &ContentKey, path: &Path) -> Result<InsertOutcome, StoreError>;

    /// Durably flush outstanding inserts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot persist the batch.
    fn commit(&mut self) -> Result<(), StoreError>;

    /// First-seen path recorded for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    fn get(&self, key: &ContentKey) -> Result<Option<PathBuf>, StoreError>;

    /// Number of entries, committed or pending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    fn len(&self) -> Result<usize, StoreError>;

    /// `true` if the index holds no entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Release the backing store. Uncommitted inserts are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Close`] if the backend reports a close failure.
    fn close(self: Box<Self>) -> Result<(), StoreError>;
}

/// Open the persistent index at `location`, or a transient one when absent.
///
/// # Errors
///
/// Returns [`StoreError`] if the persistent store cannot be opened.
pub fn open(location: Option<&Path>) -> Result<Box<dyn ContentIndex>, StoreError> {
    match location {
        Some(path) => Ok(Box::new(SqliteIndex::open(path)?)),
        None => {
            log::debug!("No index location given, duplicates are tracked for this run only");
            Ok(Box::new(MemoryIndex::new()))
        }
    }
}

/// Render a path the way it is stored in the index.
#[must_use]
pub fn path_to_key_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

//! SQLite-backed uniqueness index.
//!
//! The store is one table, `file_hash (hash TEXT NOT NULL PRIMARY KEY, path TEXT)`.
//! A key already present is answered from a read, without taking the write
//! lock. Otherwise the row is written with `ON CONFLICT(hash) DO NOTHING`: only
//! a conflict on the key counts as a duplicate, and any other constraint
//! failure is a [`StoreError`]. Writes are batched in an explicit transaction
//! that opens on the first written row after a commit.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::{path_to_key_string, ContentIndex, InsertOutcome, StoreError};
use crate::fingerprint::ContentKey;

const CREATE_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS file_hash (hash TEXT NOT NULL PRIMARY KEY, path TEXT)";

const INSERT_HASH: &str =
    "INSERT INTO file_hash (hash, path) VALUES (?1, ?2) ON CONFLICT(hash) DO NOTHING";

const SELECT_PATH: &str = "SELECT path FROM file_hash WHERE hash = ?1";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One row of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    /// Content key (primary key)
    pub key: ContentKey,
    /// First-seen path; `None` only for rows written by other tools.
    pub path: Option<PathBuf>,
}

/// Persistent index stored in a single SQLite file.
pub struct SqliteIndex {
    conn: Connection,
    location: PathBuf,
    in_transaction: bool,
}

impl std::fmt::Debug for SqliteIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteIndex")
            .field("location", &self.location)
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

impl SqliteIndex {
    /// Open or create the index at `path`.
    ///
    /// Missing parent directories are created. Creating the table is a no-op
    /// when it already exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be opened or is not a
    /// usable SQLite database.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::init(conn, path.to_path_buf())?;
        log::debug!("Opened index at {}", path.display());
        Ok(index)
    }

    /// Open a private in-memory database with the same schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let location = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: location.clone(),
            source,
        })?;
        Self::init(conn, location)
    }

    fn init(conn: Connection, location: PathBuf) -> Result<Self, StoreError> {
        let open_err = |source| StoreError::Open {
            path: location.clone(),
            source,
        };
        conn.busy_timeout(BUSY_TIMEOUT).map_err(open_err)?;
        conn.execute(CREATE_TABLE, []).map_err(open_err)?;

        Ok(Self {
            conn,
            location,
            in_transaction: false,
        })
    }

    /// Where the store lives.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Whether inserts are waiting for a commit.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.in_transaction
    }

    /// All entries in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] on database failure.
    pub fn entries(&self) -> Result<Vec<IndexEntry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT hash, path FROM file_hash ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            let hash: String = row.get(0)?;
            let path: Option<String> = row.get(1)?;
            Ok((hash, path))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (hash, path) = row?;
            let Some(key) = ContentKey::from_hex(&hash) else {
                log::warn!("Skipping index row with malformed key: {hash:?}");
                continue;
            };
            entries.push(IndexEntry {
                key,
                path: path.map(PathBuf::from),
            });
        }
        Ok(entries)
    }

    /// `Some(path)` when a row exists for `key`; the path itself may be NULL.
    fn lookup(&self, key: &ContentKey) -> Result<Option<Option<PathBuf>>, StoreError> {
        let path: Option<Option<String>> = self
            .conn
            .prepare_cached(SELECT_PATH)?
            .query_row([key.as_str()], |row| row.get(0))
            .optional()?;
        Ok(path.map(|p| p.map(PathBuf::from)))
    }

    fn begin_if_needed(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            self.conn.execute_batch("BEGIN IMMEDIATE")?;
            self.in_transaction = true;
        }
        Ok(())
    }
}

impl ContentIndex for SqliteIndex {
    fn insert(&mut self, key: &ContentKey, path: &Path) -> Result<InsertOutcome, StoreError> {
        if let Some(first_seen) = self.lookup(key)? {
            return Ok(InsertOutcome::Duplicate { first_seen });
        }

        self.begin_if_needed()?;
        let changed = self
            .conn
            .prepare_cached(INSERT_HASH)?
            .execute(params![key.as_str(), path_to_key_string(path)])?;
        if changed == 1 {
            return Ok(InsertOutcome::Inserted);
        }

        // Another connection recorded the key after the lookup.
        match self.lookup(key)? {
            Some(first_seen) => Ok(InsertOutcome::Duplicate { first_seen }),
            None => Err(StoreError::MissingKey(key.clone())),
        }
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.in_transaction {
            self.conn.execute_batch("COMMIT")?;
            self.in_transaction = false;
            log::trace!("Committed index batch to {}", self.location.display());
        }
        Ok(())
    }

    fn get(&self, key: &ContentKey) -> Result<Option<PathBuf>, StoreError> {
        Ok(self.lookup(key)?.flatten())
    }

    fn len(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM file_hash", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        let Self {
            conn,
            location,
            in_transaction,
        } = *self;

        if in_transaction {
            log::warn!(
                "Closing index at {} with uncommitted entries; they are discarded",
                location.display()
            );
            if let Err(e) = conn.execute_batch("ROLLBACK") {
                log::warn!("Rollback failed: {e}");
            }
        }

        conn.close().map_err(|(_, e)| StoreError::Close(e))?;
        log::debug!("Closed index at {}", location.display());
        Ok(())
    }
}

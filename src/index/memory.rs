//! In-memory index for runs without a persistent store.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{ContentIndex, InsertOutcome, StoreError};
use crate::fingerprint::ContentKey;

/// `HashMap`-backed index; contents are lost when the run ends.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    entries: HashMap<ContentKey, PathBuf>,
}

impl MemoryIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentIndex for MemoryIndex {
    fn insert(&mut self, key: &ContentKey, path: &Path) -> Result<InsertOutcome, StoreError> {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(existing) => Ok(InsertOutcome::Duplicate {
                first_seen: Some(existing.get().clone()),
            }),
            Entry::Vacant(slot) => {
                slot.insert(path.to_path_buf());
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    fn get(&self, key: &ContentKey) -> Result<Option<PathBuf>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.len())
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        log::debug!("Discarding in-memory index with {} entries", self.entries.len());
        Ok(())
    }
}

//! Events and run statistics produced by the engine.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::fingerprint::ContentKey;

/// Which stage produced a per-item warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A subentry could not be listed or inspected.
    Walk,
    /// A candidate could not be read or decoded.
    Fingerprint,
    /// A first-seen file could not be mirrored.
    Copy,
}

/// Something that happened to one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    /// First time this content was seen.
    New {
        /// Content key
        key: ContentKey,
        /// Candidate path, now recorded as first-seen
        path: PathBuf,
    },
    /// Content already present in the index.
    Duplicate {
        /// Content key
        key: ContentKey,
        /// Candidate path
        path: PathBuf,
        /// Path recorded earlier for the same key
        #[serde(skip_serializing_if = "Option::is_none")]
        first_seen: Option<PathBuf>,
    },
    /// A first-seen file was mirrored.
    Copied {
        /// Source path
        source: PathBuf,
        /// Mirrored path under the destination root
        target: PathBuf,
        /// Bytes written
        bytes: u64,
    },
    /// A recoverable per-item failure.
    Warning {
        /// Stage that failed
        kind: WarningKind,
        /// Path involved
        path: PathBuf,
        /// Human-readable cause
        message: String,
    },
}

/// Receiver for [`ScanEvent`]s, called in processing order.
pub trait EventSink {
    /// Handle one event.
    fn emit(&mut self, event: &ScanEvent);
}

/// Collects events, mostly useful in tests.
impl EventSink for Vec<ScanEvent> {
    fn emit(&mut self, event: &ScanEvent) {
        self.push(event.clone());
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &ScanEvent) {}
}

/// Counters for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Files yielded by the walker
    pub candidates: usize,
    /// Candidates whose content was novel
    pub new: usize,
    /// Candidates whose content was already indexed
    pub duplicates: usize,
    /// First-seen files mirrored successfully
    pub copied: usize,
    /// Total bytes mirrored
    pub bytes_copied: u64,
    /// Subentries that could not be walked
    pub walk_errors: usize,
    /// Candidates that could not be fingerprinted
    pub fingerprint_errors: usize,
    /// Mirror copies that failed
    pub copy_errors: usize,
    /// The run stopped early on a shutdown request
    pub interrupted: bool,
    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl ScanSummary {
    /// All recoverable per-item failures.
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.walk_errors + self.fingerprint_errors + self.copy_errors
    }
}

//! JSON Lines output for scan events.
//!
//! # Output Schema
//!
//! One object per line, tagged by `event`:
//!
//! ```json
//! {"event":"new","key":"1f0e...","path":"/photos/a.jpg"}
//! {"event":"duplicate","key":"1f0e...","path":"/photos/b.jpg","first_seen":"/photos/a.jpg"}
//! {"event":"copied","source":"/photos/a.jpg","target":"/backup/photos/a.jpg","bytes":1024}
//! {"event":"warning","kind":"fingerprint","path":"/photos/c.jpg","message":"..."}
//! {"event":"summary","candidates":3,"new":1,...}
//! ```

use std::io::Write;

use serde::Serialize;

use crate::engine::{EventSink, ScanEvent, ScanSummary};

#[derive(Serialize)]
struct SummaryLine<'a> {
    event: &'static str,
    #[serde(flatten)]
    summary: &'a ScanSummary,
    duration_ms: u64,
    finished_at: chrono::DateTime<chrono::Utc>,
}

/// Writes each event as a compact JSON object on its own line.
pub struct JsonSink<W: Write> {
    out: W,
    failed: bool,
}

impl<W: Write> JsonSink<W> {
    /// Create a sink over `out`.
    pub fn new(out: W) -> Self {
        Self { out, failed: false }
    }

    /// Write the final summary object.
    pub fn write_summary(&mut self, summary: &ScanSummary) {
        let line = SummaryLine {
            event: "summary",
            summary,
            duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
            finished_at: chrono::Utc::now(),
        };
        self.write_value(&line);
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_value<T: Serialize>(&mut self, value: &T) {
        if self.failed {
            return;
        }
        let result = serde_json::to_writer(&mut self.out, value)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(self.out));
        if let Err(e) = result {
            log::warn!("Failed to write JSON output: {e}");
            self.failed = true;
        }
    }
}

impl<W: Write> EventSink for JsonSink<W> {
    fn emit(&mut self, event: &ScanEvent) {
        self.write_value(event);
    }
}

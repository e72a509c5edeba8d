//! Human-readable event lines.
//!
//! ```text
//! hash: 1f0e... path: /photos/a.jpg
//! hash: 1f0e... path: /photos/copy_of_a.jpg is a duplicate
//! copied /photos/a.jpg -> /backup/photos/a.jpg
//! ```

use std::io::Write;

use bytesize::ByteSize;
use yansi::Paint;

use crate::engine::{EventSink, ScanEvent, ScanSummary};

/// Writes one line per event.
pub struct TextSink<W: Write> {
    out: W,
    color: bool,
    failed: bool,
}

impl<W: Write> TextSink<W> {
    /// Create a sink over `out`; `color` enables ANSI styling.
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            failed: false,
        }
    }

    /// Write the end-of-run summary line.
    pub fn write_summary(&mut self, summary: &ScanSummary) {
        let mut line = format!(
            "{} files: {} new, {} duplicates",
            summary.candidates, summary.new, summary.duplicates
        );
        if summary.copied > 0 || summary.copy_errors > 0 {
            line.push_str(&format!(
                ", {} copied ({})",
                summary.copied,
                ByteSize(summary.bytes_copied)
            ));
        }
        if summary.warnings() > 0 {
            line.push_str(&format!(", {} warnings", summary.warnings()));
        }
        if summary.interrupted {
            line.push_str(" (interrupted)");
        }
        let line = if self.color {
            line.bold().to_string()
        } else {
            line
        };
        self.write_line(&line);
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn format(&self, event: &ScanEvent) -> Option<String> {
        let line = match event {
            ScanEvent::New { key, path } => format!("hash: {} path: {}", key, path.display()),
            ScanEvent::Duplicate { key, path, .. } => {
                let line = format!("hash: {} path: {} is a duplicate", key, path.display());
                if self.color {
                    line.yellow().to_string()
                } else {
                    line
                }
            }
            ScanEvent::Copied { source, target, .. } => {
                let line = format!("copied {} -> {}", source.display(), target.display());
                if self.color {
                    line.green().to_string()
                } else {
                    line
                }
            }
            // Warnings already go through the logger.
            ScanEvent::Warning { .. } => return None,
        };
        Some(line)
    }

    fn write_line(&mut self, line: &str) {
        if self.failed {
            return;
        }
        if let Err(e) = writeln!(self.out, "{line}") {
            log::warn!("Failed to write output: {e}");
            self.failed = true;
        }
    }
}

impl<W: Write> EventSink for TextSink<W> {
    fn emit(&mut self, event: &ScanEvent) {
        if let Some(line) = self.format(event) {
            self.write_line(&line);
        }
    }
}

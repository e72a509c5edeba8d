//! Console output for scan events.
//!
//! - [`text`]: line-oriented, human readable, optionally colored
//! - [`json`]: one JSON object per line for scripting
//!
//! Both sinks write to any [`std::io::Write`], so tests can capture output in
//! a `Vec<u8>`.

pub mod json;
pub mod text;

use std::io::Write;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::engine::{EventSink, ScanEvent, ScanSummary};

pub use json::JsonSink;
pub use text::TextSink;

/// Output format for scan events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON Lines
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Sink selected by [`OutputFormat`] at runtime.
pub enum Reporter<W: Write> {
    /// Human-readable lines
    Text(TextSink<W>),
    /// JSON Lines
    Json(JsonSink<W>),
}

impl<W: Write> Reporter<W> {
    /// Build the sink for `format` over `out`. `color` only affects text.
    pub fn new(format: OutputFormat, out: W, color: bool) -> Self {
        match format {
            OutputFormat::Text => Self::Text(TextSink::new(out, color)),
            OutputFormat::Json => Self::Json(JsonSink::new(out)),
        }
    }

    /// Write the end-of-run summary.
    pub fn write_summary(&mut self, summary: &ScanSummary) {
        match self {
            Self::Text(sink) => sink.write_summary(summary),
            Self::Json(sink) => sink.write_summary(summary),
        }
    }

    /// Consume the reporter and return the writer.
    pub fn into_inner(self) -> W {
        match self {
            Self::Text(sink) => sink.into_inner(),
            Self::Json(sink) => sink.into_inner(),
        }
    }
}

impl<W: Write> EventSink for Reporter<W> {
    fn emit(&mut self, event: &ScanEvent) {
        match self {
            Self::Text(sink) => sink.emit(event),
            Self::Json(sink) => sink.emit(event),
        }
    }
}

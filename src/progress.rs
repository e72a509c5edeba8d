//! Progress reporting using indicatif.
//!
//! [`ProgressSink`] wraps another [`EventSink`] and drives a spinner on stderr
//! while the scan runs. Event output from the inner sink is printed with the
//! spinner suspended, so lines never interleave with the animation.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::engine::{EventSink, ScanEvent};

/// Event sink decorator that shows a live spinner.
pub struct ProgressSink<S: EventSink> {
    inner: S,
    bar: ProgressBar,
}

impl<S: EventSink> ProgressSink<S> {
    /// Wrap `inner`. When `quiet` is set, or stderr is not a terminal, the
    /// spinner is hidden and events pass straight through.
    pub fn new(inner: S, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        bar.set_message("Scanning");
        Self { inner, bar }
    }

    /// Stop the spinner and return the inner sink.
    pub fn finish(self) -> S {
        self.bar.finish_and_clear();
        self.inner
    }
}

impl<S: EventSink> EventSink for ProgressSink<S> {
    fn emit(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::New { path, .. } | ScanEvent::Duplicate { path, .. } => {
                self.bar.inc(1);
                self.bar
                    .set_message(truncate_path(&path.to_string_lossy(), 40));
            }
            ScanEvent::Copied { .. } | ScanEvent::Warning { .. } => {}
        }

        let inner = &mut self.inner;
        self.bar.suspend(|| inner.emit(event));
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let keep = max_len.saturating_sub(3);
        let tail: String = file_name.chars().skip(name_len.saturating_sub(keep)).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}

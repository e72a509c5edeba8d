//! Scanner module for directory traversal.
//!
//! This module provides functionality for:
//! - Sorted directory walking using jwalk
//! - Hidden-file skipping
//! - Case-insensitive extension filtering
//!
//! # Example
//!
//! ```no_run
//! use dupemirror::scanner::{ExtensionFilter, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     extension: ExtensionFilter::new("jpg"),
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk().unwrap() {
//!     match entry {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod walker;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use walker::Walker;

/// Case-insensitive file name suffix filter.
///
/// Leading dots are stripped, so `"jpg"`, `".jpg"` and `"JPG"` are the same
/// filter. An empty filter (or `"*"`) matches every file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ExtensionFilter {
    suffix: Option<String>,
}

impl ExtensionFilter {
    /// Parse a filter from user input.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim().trim_start_matches('.').to_lowercase();
        if trimmed.is_empty() || trimmed == "*" {
            Self { suffix: None }
        } else {
            Self {
                suffix: Some(format!(".{trimmed}")),
            }
        }
    }

    /// A filter that accepts every file.
    #[must_use]
    pub fn any() -> Self {
        Self { suffix: None }
    }

    /// Check a file name against the filter.
    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        match &self.suffix {
            None => true,
            // Require at least one character before the dot.
            Some(suffix) => {
                let lower = file_name.to_lowercase();
                lower.len() > suffix.len() && lower.ends_with(suffix.as_str())
            }
        }
    }

    /// The extension without its leading dot, if any.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.suffix.as_deref().map(|s| &s[1..])
    }
}

impl From<String> for ExtensionFilter {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<ExtensionFilter> for String {
    fn from(filter: ExtensionFilter) -> Self {
        filter.extension().unwrap_or("*").to_string()
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Only files whose name ends with this extension are yielded.
    pub extension: ExtensionFilter,

    /// Also skip directories whose name starts with `.`.
    /// Hidden files are always skipped.
    pub skip_hidden_dirs: bool,

    /// Follow symbolic links during traversal.
    /// Warning: May cause infinite loops with symlink cycles.
    pub follow_symlinks: bool,
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

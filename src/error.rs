//! Structured error handling and exit codes.

use serde::Serialize;

use crate::engine::{ConfigError, EngineError, ScanSummary};
use crate::scanner::ScanError;

/// Exit codes for the DupeMirror application.
///
/// - 0: Success (completed normally, no per-item warnings)
/// - 1: General error (store failure or other unexpected failure)
/// - 2: Configuration error (bad root or destination, root not walkable)
/// - 3: Partial success (completed with some per-item warnings)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Scan completed without warnings.
    Success = 0,
    /// General error: An unexpected or storage error occurred.
    GeneralError = 1,
    /// Configuration error: The run was rejected before or at the root.
    ConfigError = 2,
    /// Partial success: Scan completed but some items were skipped.
    PartialSuccess = 3,
    /// Interrupted: Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DM000",
            Self::GeneralError => "DM001",
            Self::ConfigError => "DM002",
            Self::PartialSuccess => "DM003",
            Self::Interrupted => "DM130",
        }
    }

    /// Exit code for a scan that ran to completion (or was interrupted).
    #[must_use]
    pub fn from_summary(summary: &ScanSummary) -> Self {
        if summary.interrupted {
            Self::Interrupted
        } else if summary.warnings() > 0 {
            Self::PartialSuccess
        } else {
            Self::Success
        }
    }

    /// Exit code for a fatal error.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if cause.downcast_ref::<ConfigError>().is_some()
                || cause.downcast_ref::<ScanError>().is_some()
                || cause.downcast_ref::<figment::Error>().is_some()
            {
                return Self::ConfigError;
            }
            if let Some(engine) = cause.downcast_ref::<EngineError>() {
                return match engine {
                    EngineError::Config(_) | EngineError::Traversal(_) => Self::ConfigError,
                    EngineError::Store(_) => Self::GeneralError,
                };
            }
        }
        Self::GeneralError
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DM001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

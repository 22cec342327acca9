//! Structured error handling and exit codes.

use serde::Serialize;

use crate::config::ConfigError;
use crate::duplicates::FinderError;

/// Exit codes for the dedupe binary.
///
/// - 0: Success (including runs with no duplicates or per-file failures)
/// - 1: General error (unexpected failure)
/// - 2: Configuration error (bad root, bad setting; nothing was scanned)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the scan completed and every requested output was written.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Configuration error: rejected before scanning began.
    ConfigError = 2,
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
            Self::Success => "DD000",
            Self::GeneralError => "DD001",
            Self::ConfigError => "DD002",
            Self::Interrupted => "DD130",
        }
    }

    /// Classify a fatal error by walking its cause chain.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(finder) = cause.downcast_ref::<FinderError>() {
                if matches!(finder, FinderError::Interrupted) {
                    return Self::Interrupted;
                }
                if finder.is_config_error() {
                    return Self::ConfigError;
                }
            }
            if cause.downcast_ref::<ConfigError>().is_some() {
                return Self::ConfigError;
            }
        }
        Self::GeneralError
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
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

//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the forgecache binary.
///
/// - 0: Success
/// - 1: General error (unexpected failure)
/// - 2: Not found (the requested entry does not exist)
/// - 3: Partial failure (a whole-scope clear left some entries behind)
/// - 4: Invalid input (bad key or payload)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: The operation completed.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Not found: The entry or scope root does not exist.
    NotFound = 2,
    /// Partial failure: Some entries could not be removed.
    PartialFailure = 3,
    /// Invalid input: The key or payload was rejected.
    InvalidInput = 4,
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
            Self::Success => "FC000",
            Self::GeneralError => "FC001",
            Self::NotFound => "FC002",
            Self::PartialFailure => "FC003",
            Self::InvalidInput => "FC004",
        }
    }

    /// Pick the exit code matching an application error.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        use crate::cache::CacheError;

        match err.downcast_ref::<CacheError>() {
            Some(CacheError::NotFound(_)) => Self::NotFound,
            Some(CacheError::PartialClear { .. }) => Self::PartialFailure,
            Some(CacheError::InvalidKey { .. }) => Self::InvalidInput,
            _ if err.downcast_ref::<serde_json::Error>().is_some() => Self::InvalidInput,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "FC001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Cache path the error is about, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            path: err
                .downcast_ref::<crate::cache::CacheError>()
                .and_then(|e| e.path())
                .map(|p| p.display().to_string()),
        }
    }
}

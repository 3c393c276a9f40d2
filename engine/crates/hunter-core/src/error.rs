//! Error types for the Hunter engine

use thiserror::Error;

/// Result type alias using the Hunter Error
pub type Result<T> = std::result::Result<T, Error>;

/// Orchestration-level errors.
///
/// Target-side scan failures are not represented here: they travel inside
/// `ScanResult::error` so a batch or job keeps going.
#[derive(Error, Debug)]
pub enum Error {
    // === Lookup Errors ===
    #[error("scanner \"{name}\" not found")]
    ScannerNotFound { name: String },

    #[error("job \"{id}\" not found")]
    JobNotFound { id: String },

    // === Lifecycle Errors ===
    #[error("job \"{id}\" cannot be started from status {status}")]
    InvalidTransition { id: String, status: String },

    // === Request Errors ===
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid option {key}: {message}")]
    InvalidOption { key: String, message: String },

    // === Configuration Errors ===
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Whether this error means the requested scanner or job does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ScannerNotFound { .. } | Error::JobNotFound { .. })
    }

    /// Whether the caller sent something unusable (maps to a 4xx upstream)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::ScannerNotFound { .. }
                | Error::JobNotFound { .. }
                | Error::InvalidTransition { .. }
                | Error::InvalidTarget(_)
                | Error::InvalidRequest(_)
                | Error::InvalidOption { .. }
        )
    }

    /// Get an error code for logging
    pub fn code(&self) -> &'static str {
        match self {
            Error::ScannerNotFound { .. } => "SCANNER_NOT_FOUND",
            Error::JobNotFound { .. } => "JOB_NOT_FOUND",
            Error::InvalidTransition { .. } => "INVALID_TRANSITION",
            Error::InvalidTarget(_) => "INVALID_TARGET",
            Error::InvalidRequest(_) => "INVALID_REQUEST",
            Error::InvalidOption { .. } => "INVALID_OPTION",
            Error::Configuration(_) => "CONFIG_ERROR",
        }
    }
}

//! # Error Types
//!
//! Custom error types for the wheel logger using `thiserror`.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the wheel logger
#[derive(Debug, Error)]
pub enum LoggerError {
    /// Storage access permission was not granted
    #[error("no permission to write to storage")]
    StoragePermissionDenied,

    /// Storage is not mounted, or not readable and writable
    #[error("storage is unavailable")]
    StorageUnavailable,

    /// The session log file could not be opened for append
    #[error("failed to open log file {}: {source}", .path.display())]
    LogFileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Appending to the open session log failed
    #[error("failed to write log row: {0}")]
    LogWrite(#[source] std::io::Error),

    /// `start()` was requested while a session is running
    #[error("a logging session is already running")]
    AlreadyRunning,

    /// The session worker has exited and no longer accepts requests
    #[error("logging worker is no longer running")]
    WorkerGone,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoggerError {
    /// Whether this error is fatal to a start request (the session never began).
    pub fn is_preflight_failure(&self) -> bool {
        matches!(
            self,
            LoggerError::StoragePermissionDenied
                | LoggerError::StorageUnavailable
                | LoggerError::LogFileOpen { .. }
        )
    }
}

/// Result type alias for the wheel logger
pub type Result<T> = std::result::Result<T, LoggerError>;

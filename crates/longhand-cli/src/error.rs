//! Error types for the CLI

use longhand::store::StoreError;
use longhand::{ConfigError, ErrorKind};
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file could not be used
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// History storage failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output could not be produced
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// The calculation was rejected; its message is already on screen
    #[error("{message}")]
    Calculation {
        /// Error category
        kind: ErrorKind,
        /// Catalog message
        message: String,
    },

    /// Async runtime could not start
    #[error("Runtime error: {message}")]
    Runtime {
        /// Error message
        message: String,
    },
}

impl CliError {
    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a runtime error
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// True when the user has already seen this error in the output
    #[must_use]
    pub const fn is_reported(&self) -> bool {
        matches!(self, Self::Calculation { .. })
    }
}

//! Error types for the offline storage system.

use thiserror::Error;

/// Errors that can occur during offline storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Corrupt record at {path}: {message}")]
    CorruptRecord { path: String, message: String },

    #[error("Storage operation failed: {operation}")]
    OperationFailed {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn op(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type alias for offline storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

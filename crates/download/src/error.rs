//! Error types for the download engine.

use hondana_storage::StorageError;
use thiserror::Error;

/// Errors that can occur while downloading an episode.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The cooperative pause signal was observed. Recovered as a normal
    /// pause by the task controller, never surfaced as a failure.
    #[error("transfer cancelled by pause request")]
    Cancelled,

    /// Network or HTTP-level failure for a specific resource.
    #[error("transfer failed for {url}: {message}")]
    Transfer { url: String, message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DownloadError {
    pub fn transfer(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Transfer {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is the pause signal rather than a genuine failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type alias for download operations.
pub type Result<T> = std::result::Result<T, DownloadError>;

//! Download error types.
//!
//! These errors are designed to be serializable and not depend on external
//! error types like `std::io::Error`. For I/O errors, we capture the kind
//! and message as strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::{FetchError, HookAbort};

/// Error type for a single download job.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadError {
    /// I/O error while preparing directories.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g., "not found", "permission denied").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// The fetch provider could not be started or is not installed.
    #[error("Fetch provider unavailable: {message}")]
    ProviderUnavailable { message: String },

    /// The fetch provider reported a transfer failure.
    #[error("Transfer failed: {message}")]
    Transfer { message: String },

    /// The request itself was unusable (empty URL, bad path).
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Download was cancelled by user.
    #[error("Download cancelled")]
    Cancelled,

    /// General/uncategorized error.
    #[error("{message}")]
    Other { message: String },
}

impl DownloadError {
    /// Create an I/O error from a `std::io::Error`.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Io {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    pub fn transfer(message: impl Into<String>) -> Self {
        Self::Transfer {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Convert to a user-friendly message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Io { message, .. } => format!("File operation failed: {message}"),
            Self::ProviderUnavailable { message } => {
                format!("yt-dlp is not available: {message}")
            }
            Self::Transfer { message } => format!("Download failed: {message}"),
            Self::InvalidRequest { message } => format!("Cannot start download: {message}"),
            Self::Cancelled => "Download was cancelled.".to_string(),
            Self::Other { message } => message.clone(),
        }
    }
}

impl From<FetchError> for DownloadError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Cancelled | FetchError::Aborted(HookAbort::Cancelled) => Self::Cancelled,
            FetchError::ProviderUnavailable(message) => Self::ProviderUnavailable { message },
            FetchError::Aborted(HookAbort::LimitReached { bytes }) => {
                Self::transfer(format!("stopped after {bytes} bytes"))
            }
            other => Self::transfer(other.to_string()),
        }
    }
}

/// Convenience result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

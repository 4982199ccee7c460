//! Events emitted while a download job runs.

use serde::{Deserialize, Serialize};

use super::job::JobState;

/// Progress and lifecycle notifications for a single download.
///
/// Consumers receive these in order over one channel per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadEvent {
    StateChanged {
        state: JobState,
    },
    Progress {
        /// 0.0 to 100.0.
        percent: f64,
        /// Human-readable speed as reported by the provider.
        speed: String,
        /// Human-readable ETA as reported by the provider.
        eta: String,
    },
    Status {
        message: String,
    },
    Completed {
        url: String,
        title: Option<String>,
    },
    Failed {
        message: String,
    },
    Cancelled,
}

impl DownloadEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn state(state: JobState) -> Self {
        Self::StateChanged { state }
    }

    /// Whether this event closes the stream for its job.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed { .. } | Self::Cancelled
        )
    }
}

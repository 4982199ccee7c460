//! Download request, job descriptor and job lifecycle.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::types::{OutputContainer, QualityTier};

/// Seconds the provider waits on a stalled socket before retrying.
pub const DEFAULT_SOCKET_TIMEOUT_SECS: u32 = 30;

/// What the caller asks for. Unset overrides fall back to settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: Option<QualityTier>,
    pub container: Option<OutputContainer>,
    /// Fixed worker count, bypassing the advisor.
    pub workers: Option<u32>,
    /// Rate ceiling in Mbps; `Some(0.0)` means unlimited.
    pub speed_limit_mbps: Option<f64>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub const fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = Some(quality);
        self
    }

    #[must_use]
    pub const fn with_container(mut self, container: OutputContainer) -> Self {
        self.container = Some(container);
        self
    }

    #[must_use]
    pub const fn with_workers(mut self, workers: u32) -> Self {
        self.workers = Some(workers);
        self
    }

    #[must_use]
    pub const fn with_speed_limit_mbps(mut self, mbps: f64) -> Self {
        self.speed_limit_mbps = Some(mbps);
        self
    }
}

/// Independent retry budgets for whole items and single fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub retries: u32,
    pub fragment_retries: u32,
}

impl RetryPolicy {
    /// Budget used for user downloads.
    pub const GENEROUS: Self = Self {
        retries: 10,
        fragment_retries: 10,
    };

    /// Budget used for benchmark runs, where a slow retry skews the timing.
    pub const BENCHMARK: Self = Self {
        retries: 3,
        fragment_retries: 3,
    };
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::GENEROUS
    }
}

/// Fully resolved description of one download.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub url: String,
    pub quality: QualityTier,
    pub container: OutputContainer,
    pub format_selector: String,
    pub concurrency: u32,
    pub rate_limit_bytes_per_sec: Option<u64>,
    pub retries: RetryPolicy,
    pub socket_timeout_secs: u32,
    pub cancel: CancellationToken,
}

/// Convert a Mbps ceiling to bytes per second.
///
/// Zero, negative or non-finite input means unlimited.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rate_limit_from_mbps(mbps: f64) -> Option<u64> {
    if !mbps.is_finite() || mbps <= 0.0 {
        return None;
    }
    Some((mbps * 1024.0 * 1024.0 / 8.0) as u64)
}

/// Lifecycle of a download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    ResolvingMetadata,
    Downloading,
    Completed,
    Cancelled,
    Failed,
}

impl JobState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Idle, Self::ResolvingMetadata)
            | (Self::ResolvingMetadata, Self::Downloading)
            | (
                Self::Idle | Self::ResolvingMetadata | Self::Downloading,
                Self::Cancelled | Self::Failed,
            )
            | (Self::Downloading, Self::Completed) => true,
            _ => false,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ResolvingMetadata => "resolving_metadata",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

/// Result of a successful download.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedDownload {
    pub url: String,
    pub title: Option<String>,
    pub output_dir: PathBuf,
    pub concurrency: u32,
    pub bytes_transferred: u64,
}

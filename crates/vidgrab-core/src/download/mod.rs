//! Download domain: requests, resolved jobs, lifecycle, events and errors.

mod errors;
mod events;
mod job;
mod types;

pub use errors::{DownloadError, DownloadResult};
pub use events::DownloadEvent;
pub use job::{
    CompletedDownload, DEFAULT_SOCKET_TIMEOUT_SECS, DownloadJob, DownloadRequest, JobState,
    RetryPolicy, rate_limit_from_mbps,
};
pub use types::{OutputContainer, QualityTier};

//! Fetch provider port.
//!
//! The fetch provider is the external media-extraction tool that does the
//! actual transfer. Core only describes what to fetch and how progress comes
//! back; `vidgrab-download` owns the subprocess implementation.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::download::{OutputContainer, RetryPolicy};

/// Where the provider should read cookies from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieSource {
    /// Read cookies from an installed browser profile.
    Browser(String),
    /// Read cookies from a Netscape-format cookie file.
    File(PathBuf),
}

/// Options passed to every provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    pub format_selector: String,
    /// Output template, including the directory.
    pub output_template: String,
    pub merge_container: Option<OutputContainer>,
    pub concurrent_fragments: u32,
    pub retries: RetryPolicy,
    pub socket_timeout_secs: Option<u32>,
    pub rate_limit_bytes_per_sec: Option<u64>,
    pub http_chunk_size_bytes: Option<u64>,
    pub buffer_size_bytes: Option<u64>,
    pub cache_dir: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub cookies: Option<CookieSource>,
    pub ffmpeg_location: Option<PathBuf>,
    /// Keep the separate streams after merging.
    pub keep_original: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            format_selector: "bestvideo+bestaudio/best".to_string(),
            output_template: "%(title)s.%(ext)s".to_string(),
            merge_container: None,
            concurrent_fragments: 1,
            retries: RetryPolicy::default(),
            socket_timeout_secs: None,
            rate_limit_bytes_per_sec: None,
            http_chunk_size_bytes: None,
            buffer_size_bytes: None,
            cache_dir: None,
            temp_dir: None,
            cookies: None,
            ffmpeg_location: None,
            keep_original: false,
        }
    }
}

/// One format entry reported by the provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormatInfo {
    pub format_id: String,
    pub ext: Option<String>,
    pub height: Option<u32>,
    pub filesize: Option<u64>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
}

/// Metadata resolved without downloading.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub duration_secs: Option<f64>,
    pub uploader: Option<String>,
    /// Expected total size of the selected formats, when known.
    pub size_bytes: Option<u64>,
    pub formats: Vec<FormatInfo>,
}

impl MediaMetadata {
    /// Expected size in MiB.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size_mb(&self) -> Option<f64> {
        self.size_bytes.map(|b| b as f64 / 1_048_576.0)
    }
}

/// A single progress report from an active transfer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressTick {
    /// Bytes downloaded so far, summed over every file of the job.
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub percent: f64,
    pub speed: String,
    pub eta: String,
}

/// Events the provider reports while fetching.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    Downloading(ProgressTick),
    /// One file finished; post-processing may follow.
    Finished { filename: Option<String> },
}

/// Reason a progress hook stopped the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HookAbort {
    #[error("cancelled")]
    Cancelled,
    #[error("byte limit reached after {bytes} bytes")]
    LimitReached { bytes: u64 },
}

/// Progress hook invoked for every provider event.
///
/// Returning `Err` stops the transfer; the provider then returns
/// `FetchError::Aborted` carrying the same reason.
pub type ProgressHook<'a> = dyn FnMut(&ProviderEvent) -> Result<(), HookAbort> + Send + 'a;

/// Summary of a finished transfer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchOutcome {
    pub bytes_transferred: u64,
    pub filename: Option<String>,
}

/// Errors reported by a fetch provider.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider executable is missing or not runnable.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider ran and exited with an error.
    #[error("provider failed: {0}")]
    ProcessFailed(String),

    /// Output from the provider could not be understood.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Metadata JSON could not be parsed.
    #[error("metadata error: {0}")]
    Metadata(String),

    #[error("I/O error: {0}")]
    Io(String),

    /// The progress hook stopped the transfer.
    #[error("aborted: {0}")]
    Aborted(HookAbort),

    /// The cancellation token fired.
    #[error("cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether the transfer ended because somebody asked it to.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Aborted(HookAbort::Cancelled))
    }
}

/// Port for the media-extraction tool.
#[async_trait]
pub trait FetchProvider: Send + Sync {
    /// Resolve metadata for `url` without downloading media.
    async fn resolve_metadata(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<MediaMetadata, FetchError>;

    /// Fetch `url`, invoking `hook` for every progress event.
    ///
    /// Implementations must stop promptly when `cancel` fires and must stop
    /// on the first hook error.
    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
        hook: &mut ProgressHook<'_>,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, FetchError>;
}

//! yt-dlp fetch provider.
//!
//! - `args`: option-to-flag mapping
//! - `protocol`: progress line and metadata parsing
//! - `bridge`: subprocess lifecycle, cancellation and stderr capture

mod args;
mod bridge;
mod protocol;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vidgrab_core::ports::{
    FetchError, FetchOptions, FetchOutcome, FetchProvider, MediaMetadata, ProgressHook,
};

pub use protocol::{PROGRESS_MARKER, ProtocolError};

#[cfg(target_os = "windows")]
const BINARY_NAME: &str = "yt-dlp.exe";
#[cfg(not(target_os = "windows"))]
const BINARY_NAME: &str = "yt-dlp";

/// Fetch provider backed by the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlpProvider {
    binary: PathBuf,
}

impl YtDlpProvider {
    /// Use the executable at `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Resolve the executable: an explicit override first, then `PATH`.
    pub fn discover(override_path: Option<PathBuf>) -> Result<Self, FetchError> {
        if let Some(path) = override_path {
            if path.is_file() {
                debug!(path = %path.display(), "Using configured yt-dlp");
                return Ok(Self::new(path));
            }
            return Err(FetchError::ProviderUnavailable(format!(
                "configured yt-dlp not found at {}",
                path.display()
            )));
        }

        which::which(BINARY_NAME)
            .map(|path| {
                debug!(path = %path.display(), "Using yt-dlp from PATH");
                Self::new(path)
            })
            .map_err(|_| {
                FetchError::ProviderUnavailable(
                    "yt-dlp is not installed or not on PATH".to_string(),
                )
            })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Ask the executable for its version string.
    pub async fn version(&self) -> Result<String, FetchError> {
        let args = [OsString::from("--version")];
        let out = bridge::run_to_string(&self.binary, &args, &CancellationToken::new()).await?;
        Ok(out.trim().to_string())
    }
}

#[async_trait]
impl FetchProvider for YtDlpProvider {
    async fn resolve_metadata(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<MediaMetadata, FetchError> {
        debug!(url, "Resolving metadata");
        let args = args::metadata_args(url, options);
        let json = bridge::run_to_string(&self.binary, &args, &CancellationToken::new()).await?;
        protocol::parse_metadata(&json).map_err(|e| FetchError::Metadata(e.to_string()))
    }

    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
        hook: &mut ProgressHook<'_>,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, FetchError> {
        info!(
            url,
            format = %options.format_selector,
            fragments = options.concurrent_fragments,
            "Starting yt-dlp"
        );
        let args = args::fetch_args(url, options);
        bridge::run_with_progress(&self.binary, &args, hook, cancel).await
    }
}

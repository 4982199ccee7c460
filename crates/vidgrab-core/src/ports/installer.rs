//! Installer port for auxiliary tools the provider depends on.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Progress reported while an installer works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallProgress {
    /// Archive bytes received so far; `total` is 0 when unknown.
    Downloading { downloaded: u64, total: u64 },
    Extracting,
    Status(String),
}

/// Callback receiving installer progress.
pub type ProgressFn<'a> = &'a (dyn Fn(InstallProgress) + Send + Sync);

/// Errors raised while locating or installing a tool.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("verification failed: {0}")]
    Verification(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for an idempotent "make sure this tool exists" operation.
#[async_trait]
pub trait InstallerPort: Send + Sync {
    /// Short name used in logs and status output.
    fn name(&self) -> &'static str;

    /// Locate the tool without installing anything.
    async fn locate(&self) -> Option<PathBuf>;

    /// Return the tool's location, installing it first if necessary.
    async fn ensure(&self, progress: ProgressFn<'_>) -> Result<PathBuf, InstallError>;
}

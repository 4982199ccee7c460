//! CLI-specific error types and mappings.
//!
//! Domain errors from the core and adapter crates are mapped to a
//! `CliError`, which decides the process exit code.

use thiserror::Error;
use vidgrab_core::{
    BenchmarkError, DownloadError, FetchError, InstallError, PathError, SettingsError,
    SettingsServiceError,
};

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// A download or metadata lookup failed.
    #[error("{0}")]
    Download(String),

    /// Argument or setting value rejected.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// yt-dlp could not be found or started.
    #[error("yt-dlp is not available: {0}")]
    ProviderUnavailable(String),

    /// ffmpeg or the cookie plugin could not be installed.
    #[error("Tool installation failed: {0}")]
    Tool(String),

    #[error("Benchmark failed: {0}")]
    Benchmark(String),

    /// Interrupted with Ctrl-C.
    #[error("Cancelled")]
    Cancelled,
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    /// - 130: Terminated by Ctrl-C
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Download(_) | Self::Benchmark(_) => 1,
            Self::Arguments(_) => 2,
            Self::ProviderUnavailable(_) => 69, // EX_UNAVAILABLE
            Self::Tool(_) => 71,                // EX_OSERR
            Self::Io(_) => 74,                  // EX_IOERR
            Self::Config(_) => 78,              // EX_CONFIG
            Self::Cancelled => 130,
        }
    }
}

impl From<DownloadError> for CliError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::Cancelled => Self::Cancelled,
            DownloadError::ProviderUnavailable { message } => Self::ProviderUnavailable(message),
            DownloadError::InvalidRequest { message } => Self::Arguments(message),
            DownloadError::Io { message, .. } => Self::Io(message),
            other => Self::Download(other.user_message()),
        }
    }
}

impl From<FetchError> for CliError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::ProviderUnavailable(message) => Self::ProviderUnavailable(message),
            other if other.is_cancellation() => Self::Cancelled,
            other => Self::Download(other.to_string()),
        }
    }
}

impl From<SettingsServiceError> for CliError {
    fn from(err: SettingsServiceError) -> Self {
        match err {
            SettingsServiceError::Invalid(e) => e.into(),
            SettingsServiceError::Store(e) => Self::Io(e.to_string()),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Arguments(err.to_string())
    }
}

impl From<InstallError> for CliError {
    fn from(err: InstallError) -> Self {
        Self::Tool(err.to_string())
    }
}

impl From<BenchmarkError> for CliError {
    fn from(err: BenchmarkError) -> Self {
        match err {
            BenchmarkError::Cancelled => Self::Cancelled,
            other => Self::Benchmark(other.to_string()),
        }
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

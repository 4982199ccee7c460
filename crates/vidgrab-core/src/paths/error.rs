use std::path::PathBuf;
use thiserror::Error;

/// Failure to locate or prepare one of the application directories.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("No home directory found for the current user")]
    NoHomeDir,

    #[error("No per-user configuration directory on this platform; set VIDGRAB_CONFIG_DIR")]
    NoConfigDir,

    #[error("Expected a directory at {0}, found a file")]
    NotADirectory(PathBuf),

    #[error("Cannot create {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    #[error("Cannot write into {path}: {reason}")]
    NotWritable { path: PathBuf, reason: String },

    #[error("Empty directory path")]
    EmptyPath,
}

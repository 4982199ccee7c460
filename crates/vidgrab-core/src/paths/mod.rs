//! Path resolution for vidgrab's configuration, tool and scratch directories.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - Resolution happens once, in [`AppPaths::resolve`]; everything else
//!   receives an `AppPaths` value
//! - OS-specific logic is kept private in `platform`

mod ensure;
mod error;
mod platform;

use std::path::{Path, PathBuf};

pub use ensure::{check_writable, ensure_writable_dir};
pub use error::PathError;
pub use platform::{CONFIG_DIR_ENV, config_root, ytdlp_plugin_dir};

/// Name of the persisted settings file inside the config dir.
pub const SETTINGS_FILE_NAME: &str = "config.json";

/// Resolved application directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    config_dir: PathBuf,
    plugin_dir: PathBuf,
}

impl AppPaths {
    /// Resolve from the environment and platform defaults.
    pub fn resolve() -> Result<Self, PathError> {
        Ok(Self {
            config_dir: config_root()?,
            plugin_dir: ytdlp_plugin_dir()?,
        })
    }

    /// Root every directory under `root`. Used by tests and portable setups.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            plugin_dir: root.join("yt-dlp").join("plugins"),
            config_dir: root,
        }
    }

    /// Move the config root to `dir`; the plugin directory is unchanged.
    #[must_use]
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE_NAME)
    }

    /// Where a locally installed ffmpeg lives (`<config>/ffmpeg`).
    pub fn tools_dir(&self) -> PathBuf {
        self.config_dir.join("ffmpeg")
    }

    /// Provider cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.config_dir.join("cache")
    }

    /// Provider and benchmark scratch space.
    pub fn temp_dir(&self) -> PathBuf {
        self.config_dir.join("temp")
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// Create the config, cache and temp directories.
    pub fn ensure_all(&self) -> Result<(), PathError> {
        for dir in [self.config_dir.clone(), self.cache_dir(), self.temp_dir()] {
            ensure_writable_dir(&dir)?;
        }
        Ok(())
    }
}

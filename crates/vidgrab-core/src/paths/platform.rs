//! Platform-specific directory roots.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

/// Environment variable that overrides the configuration directory.
pub const CONFIG_DIR_ENV: &str = "VIDGRAB_CONFIG_DIR";

/// Root directory for vidgrab's own files.
///
/// Resolution order:
/// 1. `VIDGRAB_CONFIG_DIR` environment variable
/// 2. Platform config directory joined with `vidgrab`
pub fn config_root() -> Result<PathBuf, PathError> {
    if let Some(path) = env::var_os(CONFIG_DIR_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().ok_or(PathError::NoConfigDir)?;
    Ok(base.join("vidgrab"))
}

/// Directory yt-dlp scans for plugins.
///
/// `%APPDATA%/yt-dlp/plugins` on Windows, `~/.config/yt-dlp/plugins`
/// everywhere else (yt-dlp does not use the macOS Application Support dir).
pub fn ytdlp_plugin_dir() -> Result<PathBuf, PathError> {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().ok_or(PathError::NoConfigDir)?;
        Ok(base.join("yt-dlp").join("plugins"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
        Ok(home.join(".config").join("yt-dlp").join("plugins"))
    }
}

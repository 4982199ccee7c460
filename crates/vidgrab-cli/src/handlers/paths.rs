//! Paths command handler.
//!
//! Displays all resolved paths for diagnostics and debugging.

use vidgrab_core::AppPaths;

use crate::presentation::print_row;

/// Print every directory vidgrab reads or writes.
pub fn execute(paths: &AppPaths) {
    print_row("Config directory", paths.config_dir().display());
    print_row("Settings file", paths.settings_file().display());
    print_row("ffmpeg install dir", paths.tools_dir().display());
    print_row("Cache directory", paths.cache_dir().display());
    print_row("Temp directory", paths.temp_dir().display());
    print_row("yt-dlp plugin dir", paths.plugin_dir().display());
}

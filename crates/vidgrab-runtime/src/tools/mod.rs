//! Installers for the auxiliary tools the provider depends on.

mod archive;
mod cookie_plugin;
mod ffmpeg;

pub use cookie_plugin::CookiePluginInstaller;
pub use ffmpeg::{ArchiveKind, ArchiveSource, FfmpegInstaller, responds_to_version};

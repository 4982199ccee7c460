//! OS-level adapters for vidgrab.
//!
//! Implements the core ports that touch the host: CPU probing, the JSON
//! settings file and the installers for ffmpeg and the cookie-unlock plugin.

#![deny(unsafe_code)]

mod settings_store;
mod system;
pub mod tools;

pub use settings_store::JsonSettingsStore;
pub use system::DefaultSystemProbe;
pub use tools::{ArchiveKind, ArchiveSource, CookiePluginInstaller, FfmpegInstaller};

//! Helper tool subcommands.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum ToolsCommand {
    /// Make sure ffmpeg is available, downloading a static build if needed
    Ffmpeg,

    /// Install the browser cookie unlock plugin for yt-dlp
    Plugin,

    /// Show where yt-dlp, ffmpeg and the cookie plugin were found
    Status,
}

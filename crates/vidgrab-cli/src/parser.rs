//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the vidgrab video downloader.
///
/// Global options apply to every subcommand.
#[derive(Parser)]
#[command(name = "vidgrab")]
#[command(about = "Download videos with yt-dlp using an adaptive fragment count")]
#[command(version)]
pub struct Cli {
    /// Override the configuration directory for this invocation
    #[arg(long = "config-dir", global = true, env = "VIDGRAB_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

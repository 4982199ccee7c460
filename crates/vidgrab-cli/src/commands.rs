//! Main commands enum and primary subcommands.

use clap::Subcommand;
use vidgrab_core::settings::MAX_CONCURRENT_FRAGMENTS;
use vidgrab_core::{OutputContainer, QualityTier};

use crate::benchmark_commands::BenchmarkCommand;
use crate::config_commands::ConfigCommand;
use crate::tools_commands::ToolsCommand;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Download a video
    Download {
        /// Video page URL
        url: String,
        /// Quality tier: Best, 2160p, 1440p, 1080p, 720p, 480p or 360p
        #[arg(short, long)]
        quality: Option<QualityTier>,
        /// Output container: mp4, mkv or ts
        #[arg(short, long)]
        format: Option<OutputContainer>,
        /// Fixed number of parallel fragments (skips the advisor)
        #[arg(
            short,
            long,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_CONCURRENT_FRAGMENTS))
        )]
        workers: Option<u32>,
        /// Rate limit in Mbps for this download (0 = unlimited)
        #[arg(long)]
        limit_mbps: Option<f64>,
    },

    /// Show video metadata and the fragment count a download would use
    Info {
        /// Video page URL
        url: String,
    },

    /// Show the recommended fragment count for a file size
    Advise {
        /// Expected file size in MB (omit when unknown)
        #[arg(long)]
        size_mb: Option<f64>,
    },

    /// Measure download throughput to calibrate the fragment count
    Benchmark {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        #[command(subcommand)]
        command: Option<BenchmarkCommand>,
    },

    /// Read and change persisted settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Install or inspect helper tools (ffmpeg, cookie plugin)
    Tools {
        #[command(subcommand)]
        command: ToolsCommand,
    },

    /// Show resolved paths for all vidgrab directories
    Paths,
}

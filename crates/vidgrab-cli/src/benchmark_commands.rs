//! Benchmark subcommands.

use clap::Subcommand;

/// Actions on the recorded benchmark. Without one, `benchmark` runs it.
#[derive(Subcommand)]
pub enum BenchmarkCommand {
    /// Print the recorded benchmark calibration
    Show,

    /// Forget the recorded calibration and fall back to CPU tiers
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

//! Configuration subcommands.

use clap::Subcommand;

/// Settings management commands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print every setting as JSON
    Show,

    /// Print one setting
    Get {
        /// Setting name (e.g. `download_path`, `auto_concurrency`)
        key: String,
    },

    /// Change one setting
    ///
    /// The value is read as JSON when it parses (`true`, `8`, `null`),
    /// otherwise as a plain string.
    Set {
        /// Setting name
        key: String,
        /// New value
        value: String,
    },

    /// Restore every setting to its default
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Print the settings file location
    Path,
}

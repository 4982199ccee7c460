//! Command-line adapter for vidgrab.
//!
//! Parses arguments, wires the runtime adapters into the download and
//! benchmark services and renders their events in the terminal.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;

// Used by the binary only
use dotenvy as _;
use tracing_subscriber as _;

pub mod benchmark_commands;
pub mod bootstrap;
pub mod commands;
pub mod config_commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;
pub mod tools_commands;
pub mod utils;

// Re-export primary types for convenient access
pub use benchmark_commands::BenchmarkCommand;
pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::Commands;
pub use config_commands::ConfigCommand;
pub use error::CliError;
pub use parser::Cli;
pub use tools_commands::ToolsCommand;

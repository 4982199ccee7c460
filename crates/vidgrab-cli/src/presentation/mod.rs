//! Shared CLI presentation utilities.
//!
//! This module provides reusable display and formatting functions
//! for consistent CLI output across commands.
//!
//! # Guidelines
//!
//! - Keep this module format-only: no domain transforms
//! - Progress renderers consume events; they never drive the operation

pub mod progress;
pub mod summary;
pub mod tables;

// Re-export commonly used items
pub use progress::{BenchmarkProgress, DownloadProgress, InstallProgressBar};
pub use summary::{print_benchmark_result, print_metadata, print_worker_decision, run_line};
pub use tables::{format_duration, format_optional, print_row, print_separator, truncate_string};

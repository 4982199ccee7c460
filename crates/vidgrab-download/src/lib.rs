//! Download execution for vidgrab.
//!
//! This crate implements the [`FetchProvider`](vidgrab_core::FetchProvider)
//! port on top of the `yt-dlp` executable and builds the two long-running
//! operations on top of it:
//!
//! - [`FetchOrchestrator`]: one user download, from tool checks to completion
//! - [`NetworkBenchmarkEngine`]: timed reference downloads that calibrate
//!   the worker-count advisor

#![deny(unsafe_code)]

mod benchmark;
mod orchestrator;
mod ytdlp;

#[cfg(test)]
mod test_support;

pub use benchmark::NetworkBenchmarkEngine;
pub use orchestrator::{FetchOrchestrator, Inspection, OUTPUT_TEMPLATE, OrchestratorDeps};
pub use ytdlp::{PROGRESS_MARKER, ProtocolError, YtDlpProvider};

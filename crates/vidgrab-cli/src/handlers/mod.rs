//! Command handlers.
//!
//! Each handler receives the `CliContext` built by `bootstrap` and returns
//! `anyhow::Result`; domain errors are converted to `CliError` first so the
//! exit code survives.

pub mod advise;
pub mod benchmark;
pub mod config;
pub mod download;
pub mod info;
pub mod paths;
pub mod tools;

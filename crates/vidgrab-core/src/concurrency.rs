//! Worker-count advisor.
//!
//! Maps the host CPU count, an optional file size and an optional benchmark
//! calibration to the number of fragments the provider fetches in parallel.
//! The advisor never fails; every input combination yields a count of at
//! least one.

use serde::Serialize;
use tracing::debug;

use crate::settings::Settings;

/// Minimum MB per worker when no benchmark has been recorded.
pub const DEFAULT_MIN_SIZE_PER_WORKER_MB: u32 = 100;

/// Values a completed benchmark contributes to the advisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BenchmarkCalibration {
    /// Replaces the CPU-tiered ceiling.
    pub optimal_workers: u32,
    /// Replaces [`DEFAULT_MIN_SIZE_PER_WORKER_MB`] when present.
    pub min_size_per_worker_mb: Option<u32>,
}

/// Where the governing maximum came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    CpuTier,
    Benchmark,
}

/// Full reasoning behind a recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerCountDecision {
    pub workers: u32,
    pub governing_maximum: u32,
    /// Size-derived count before the ceiling was applied; `None` when the
    /// size was unknown.
    pub size_based: Option<u32>,
    pub min_size_per_worker_mb: u32,
    pub source: DecisionSource,
}

/// Recommends a parallel fragment count.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyAdvisor {
    cpu_count: u32,
    calibration: Option<BenchmarkCalibration>,
}

impl ConcurrencyAdvisor {
    pub const fn new(cpu_count: u32, calibration: Option<BenchmarkCalibration>) -> Self {
        Self {
            cpu_count,
            calibration,
        }
    }

    /// Build an advisor from the persisted benchmark fields.
    #[must_use]
    pub fn from_settings(cpu_count: u32, settings: &Settings) -> Self {
        Self::new(cpu_count, settings.benchmark_calibration())
    }

    /// Ceiling derived from the CPU count alone.
    #[must_use]
    pub const fn cpu_tier_maximum(cpu_count: u32) -> u32 {
        if cpu_count >= 8 {
            8
        } else if cpu_count >= 4 {
            6
        } else {
            4
        }
    }

    /// Maximum worker count in effect, before size is considered.
    #[must_use]
    pub fn governing_maximum(&self) -> u32 {
        self.calibration
            .map(|c| c.optimal_workers)
            .filter(|w| *w > 0)
            .unwrap_or_else(|| Self::cpu_tier_maximum(self.cpu_count))
    }

    /// MB each worker should have to itself.
    #[must_use]
    pub fn min_size_per_worker_mb(&self) -> u32 {
        self.calibration
            .and_then(|c| c.min_size_per_worker_mb)
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_MIN_SIZE_PER_WORKER_MB)
    }

    /// Recommended worker count for a file of `file_size_mb`.
    #[must_use]
    pub fn recommend(&self, file_size_mb: Option<f64>) -> u32 {
        self.decide(file_size_mb).workers
    }

    /// Recommended worker count together with how it was reached.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn decide(&self, file_size_mb: Option<f64>) -> WorkerCountDecision {
        let governing_maximum = self.governing_maximum();
        let source = if self.calibration.is_some_and(|c| c.optimal_workers > 0) {
            DecisionSource::Benchmark
        } else {
            DecisionSource::CpuTier
        };
        let min_size = self.min_size_per_worker_mb();

        let size_based = file_size_mb.filter(|s| s.is_finite()).map(|size| {
            let per_worker = size.max(0.0) / f64::from(min_size);
            // Saturating float-to-int cast; huge files just hit the ceiling.
            (per_worker.floor() as u32).max(1)
        });

        let workers = size_based
            .map_or(governing_maximum, |s| s.min(governing_maximum))
            .max(1);

        debug!(
            cpu_count = self.cpu_count,
            file_size_mb = ?file_size_mb,
            min_size_per_worker_mb = min_size,
            source = ?source,
            governing_maximum,
            size_based = ?size_based,
            workers,
            "Worker count decided"
        );

        WorkerCountDecision {
            workers,
            governing_maximum,
            size_based,
            min_size_per_worker_mb: min_size,
            source,
        }
    }
}

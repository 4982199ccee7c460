use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reference payload A, downloaded in full.
pub const DEFAULT_PAYLOAD_A_URL: &str = "https://youtu.be/p_lrljKEVQY";

/// Reference payload B, downloaded up to [`PARTIAL_DOWNLOAD_LIMIT_MB`].
pub const DEFAULT_PAYLOAD_B_URL: &str = "https://youtu.be/QNlIlfT3N58";

/// Byte ceiling for payload B, in MiB.
pub const PARTIAL_DOWNLOAD_LIMIT_MB: u64 = 824;

/// Relative slowdown accepted in exchange for fewer workers.
pub const SELECTION_THRESHOLD: f64 = 0.10;

/// Lower bound for the recommended minimum size per worker, in MB.
pub const MIN_SIZE_FLOOR_MB: u32 = 50;

/// Which reference payload a run used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Payload {
    A,
    B,
}

impl Payload {
    /// Byte ceiling for this payload, if it is only partially downloaded.
    #[must_use]
    pub const fn byte_limit(self) -> Option<u64> {
        match self {
            Self::A => None,
            Self::B => Some(PARTIAL_DOWNLOAD_LIMIT_MB * 1024 * 1024),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

/// Timing of one successful run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub duration_secs: f64,
    pub size_mb: f64,
    pub speed_mbps: f64,
    /// The run stopped at the payload's byte ceiling.
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Measured(Measurement),
    Failed { error: String },
}

/// One (payload, worker count) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub workers: u32,
    pub payload: Payload,
    pub outcome: RunOutcome,
}

impl RunRecord {
    /// Measured speed, or `None` for a failed run.
    #[must_use]
    pub const fn speed_mbps(&self) -> Option<f64> {
        match &self.outcome {
            RunOutcome::Measured(m) => Some(m.speed_mbps),
            RunOutcome::Failed { .. } => None,
        }
    }
}

/// Per-worker-count average across both payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedThroughput {
    pub workers: u32,
    pub speed_a_mbps: Option<f64>,
    pub speed_b_mbps: Option<f64>,
    pub avg_speed_mbps: f64,
}

/// Outcome of a complete benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Smallest worker count within the threshold of the best.
    pub optimal_workers: u32,
    /// Worker count with the highest average speed.
    pub best_workers: u32,
    pub min_size_per_worker_mb: u32,
    pub best_speed_mbps: f64,
    pub avg_speed_mb_per_sec: f64,
    pub results_a: Vec<RunRecord>,
    pub results_b: Vec<RunRecord>,
    /// Sorted by average speed, fastest first.
    pub combined: Vec<CombinedThroughput>,
}

/// Progress notifications from a running benchmark.
#[derive(Debug, Clone, PartialEq)]
pub enum BenchmarkEvent {
    Progress { percent: f64 },
    Status(String),
    RunFinished(RunRecord),
}

#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("no worker counts to test")]
    NoCandidates,

    #[error("all {attempted} benchmark runs failed")]
    AllRunsFailed { attempted: usize },

    #[error("scratch directory error: {0}")]
    Scratch(#[from] std::io::Error),

    #[error("benchmark cancelled")]
    Cancelled,
}

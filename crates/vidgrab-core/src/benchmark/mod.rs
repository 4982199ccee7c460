//! Network benchmark: data types and the pure analysis that turns raw runs
//! into a calibration.
//!
//! Running the transfers is the download crate's job; everything here is
//! deterministic and testable without a network.

mod analysis;
mod types;

pub use analysis::{
    analyze, candidate_worker_counts, combine, min_size_per_worker_mb, select_optimal,
    throughput_mbps,
};
pub use types::{
    BenchmarkError, BenchmarkEvent, BenchmarkResult, CombinedThroughput,
    DEFAULT_PAYLOAD_A_URL, DEFAULT_PAYLOAD_B_URL, MIN_SIZE_FLOOR_MB, Measurement,
    PARTIAL_DOWNLOAD_LIMIT_MB, Payload, RunOutcome, RunRecord, SELECTION_THRESHOLD,
};

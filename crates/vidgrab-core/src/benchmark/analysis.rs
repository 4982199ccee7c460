use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::info;

use super::types::{
    BenchmarkError, BenchmarkResult, CombinedThroughput, MIN_SIZE_FLOOR_MB, RunRecord,
    SELECTION_THRESHOLD,
};

/// Seconds of transfer each worker should get at the measured speed.
const MIN_CHUNK_DURATION_SECS: f64 = 2.0;

/// Powers of two from 1 up to the largest one not above `cpu_count`.
#[must_use]
pub fn candidate_worker_counts(cpu_count: u32) -> Vec<u32> {
    let cpu = cpu_count.max(1);
    std::iter::successors(Some(1u32), |w| w.checked_mul(2))
        .take_while(|w| *w <= cpu)
        .collect()
}

/// Throughput in Mbps for `bytes` moved in `duration_secs`.
///
/// Sizes are MiB, so this is `(bytes / 2^20) * 8 / seconds`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn throughput_mbps(bytes: u64, duration_secs: f64) -> f64 {
    if bytes == 0 || !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64 / 1_048_576.0) * 8.0 / duration_secs
}

/// Average successful A and B speeds per worker count.
///
/// Worker counts without any successful run are left out. The output is
/// sorted fastest first; equal speeds keep the smaller worker count first.
#[must_use]
pub fn combine(results_a: &[RunRecord], results_b: &[RunRecord]) -> Vec<CombinedThroughput> {
    let mut by_workers: BTreeMap<u32, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for record in results_a {
        if let Some(speed) = record.speed_mbps() {
            by_workers.entry(record.workers).or_default().0 = Some(speed);
        }
    }
    for record in results_b {
        if let Some(speed) = record.speed_mbps() {
            by_workers.entry(record.workers).or_default().1 = Some(speed);
        }
    }

    let mut combined: Vec<CombinedThroughput> = by_workers
        .into_iter()
        .filter_map(|(workers, (a, b))| {
            let avg = match (a, b) {
                (Some(a), Some(b)) => (a + b) / 2.0,
                (Some(only), None) | (None, Some(only)) => only,
                (None, None) => return None,
            };
            Some(CombinedThroughput {
                workers,
                speed_a_mbps: a,
                speed_b_mbps: b,
                avg_speed_mbps: avg,
            })
        })
        .collect();

    combined.sort_by(|x, y| {
        y.avg_speed_mbps
            .partial_cmp(&x.avg_speed_mbps)
            .unwrap_or(Ordering::Equal)
            .then(x.workers.cmp(&y.workers))
    });
    combined
}

/// Pick `(optimal, best)` worker counts from combined results.
///
/// `best` has the highest average speed. `optimal` is the smallest worker
/// count whose speed is within `threshold` of the best.
#[must_use]
pub fn select_optimal(combined: &[CombinedThroughput], threshold: f64) -> Option<(u32, u32)> {
    let best = combined.iter().max_by(|x, y| {
        x.avg_speed_mbps
            .partial_cmp(&y.avg_speed_mbps)
            .unwrap_or(Ordering::Equal)
            .then(y.workers.cmp(&x.workers))
    })?;

    if best.avg_speed_mbps <= 0.0 {
        return Some((best.workers, best.workers));
    }

    let optimal = combined
        .iter()
        .filter(|c| (best.avg_speed_mbps - c.avg_speed_mbps) / best.avg_speed_mbps <= threshold)
        .map(|c| c.workers)
        .min()
        .unwrap_or(best.workers);

    Some((optimal, best.workers))
}

/// Recommended minimum MB per worker at `avg_mb_per_sec`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn min_size_per_worker_mb(avg_mb_per_sec: f64) -> u32 {
    if !avg_mb_per_sec.is_finite() || avg_mb_per_sec <= 0.0 {
        return MIN_SIZE_FLOOR_MB;
    }
    let derived = (avg_mb_per_sec * MIN_CHUNK_DURATION_SECS).floor() as u32;
    derived.max(MIN_SIZE_FLOOR_MB)
}

/// Turn raw run records into a benchmark result.
pub fn analyze(
    results_a: Vec<RunRecord>,
    results_b: Vec<RunRecord>,
) -> Result<BenchmarkResult, BenchmarkError> {
    let combined = combine(&results_a, &results_b);
    let Some((optimal_workers, best_workers)) = select_optimal(&combined, SELECTION_THRESHOLD)
    else {
        return Err(BenchmarkError::AllRunsFailed {
            attempted: results_a.len() + results_b.len(),
        });
    };

    let best_speed_mbps = combined
        .iter()
        .find(|c| c.workers == best_workers)
        .map_or(0.0, |c| c.avg_speed_mbps);
    let avg_speed_mb_per_sec = best_speed_mbps / 8.0;
    let min_size = min_size_per_worker_mb(avg_speed_mb_per_sec);

    info!(
        optimal_workers,
        best_workers,
        best_speed_mbps,
        min_size_per_worker_mb = min_size,
        "Benchmark analysed"
    );

    Ok(BenchmarkResult {
        optimal_workers,
        best_workers,
        min_size_per_worker_mb: min_size,
        best_speed_mbps,
        avg_speed_mb_per_sec,
        results_a,
        results_b,
        combined,
    })
}

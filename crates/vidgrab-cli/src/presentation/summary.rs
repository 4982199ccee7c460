//! Human-readable summaries of metadata, advisor decisions and benchmarks.

use vidgrab_core::{
    BenchmarkResult, DecisionSource, MediaMetadata, RunOutcome, RunRecord, WorkerCountDecision,
};

use super::tables::{format_duration, format_optional, print_row, print_separator, truncate_string};

const TITLE_WIDTH: usize = 60;

pub fn print_metadata(metadata: &MediaMetadata) {
    let title = metadata.title.as_deref().unwrap_or("(untitled)");
    print_row("Title", truncate_string(title, TITLE_WIDTH));
    print_row("Uploader", format_optional(metadata.uploader.as_ref(), "unknown"));
    print_row(
        "Duration",
        metadata
            .duration_secs
            .map_or_else(|| "unknown".to_string(), format_duration),
    );
    print_row(
        "Estimated size",
        metadata
            .size_mb()
            .map_or_else(|| "unknown".to_string(), |mb| format!("{mb:.1} MB")),
    );
    print_row("Formats", metadata.formats.len());
}

/// Print the advisor's reasoning.
pub fn print_worker_decision(decision: &WorkerCountDecision, cpu_count: u32) {
    let source = match decision.source {
        DecisionSource::Benchmark => "benchmark",
        DecisionSource::CpuTier => "CPU tier",
    };
    print_row("CPU cores", cpu_count);
    print_row(
        "Maximum workers",
        format!("{} (from {source})", decision.governing_maximum),
    );
    print_row("Min size per worker", format!("{} MB", decision.min_size_per_worker_mb));
    print_row(
        "Size-based count",
        format_optional(decision.size_based.as_ref(), "n/a (size unknown)"),
    );
    print_row("Recommended workers", decision.workers);
}

/// One line describing a finished benchmark run.
pub fn run_line(record: &RunRecord) -> String {
    let label = format!("Payload {} x{:<2}", record.payload.label(), record.workers);
    match &record.outcome {
        RunOutcome::Measured(m) => {
            let partial = if m.partial { " (partial)" } else { "" };
            format!(
                "{label}  {:7.2} MB/s  {:8.1} MB in {:.1}s{partial}",
                m.speed_mbps, m.size_mb, m.duration_secs
            )
        }
        RunOutcome::Failed { error } => format!("{label}  failed: {error}"),
    }
}

pub fn print_benchmark_result(result: &BenchmarkResult) {
    println!();
    println!("{:>8}  {:>12}  {:>12}  {:>12}", "Workers", "A (MB/s)", "B (MB/s)", "Avg (MB/s)");
    print_separator(52);
    let speed = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |s| format!("{s:.2}"));
    for row in &result.combined {
        println!(
            "{:>8}  {:>12}  {:>12}  {:>12.2}",
            row.workers,
            speed(row.speed_a_mbps),
            speed(row.speed_b_mbps),
            row.avg_speed_mbps
        );
    }
    println!();
    print_row("Fastest", format!("{} workers at {:.2} MB/s", result.best_workers, result.best_speed_mbps));
    print_row("Optimal workers", result.optimal_workers);
    print_row("Min size per worker", format!("{} MB", result.min_size_per_worker_mb));
}

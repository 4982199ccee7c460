//! Network benchmark runner.
//!
//! Downloads two reference payloads at each candidate worker count, times
//! every run and hands the records to the pure analysis in
//! `vidgrab_core::benchmark`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vidgrab_core::benchmark::{
    DEFAULT_PAYLOAD_A_URL, DEFAULT_PAYLOAD_B_URL, analyze, candidate_worker_counts,
    throughput_mbps,
};
use vidgrab_core::download::DEFAULT_SOCKET_TIMEOUT_SECS;
use vidgrab_core::ports::{
    EventEmitter, FetchError, FetchOptions, FetchProvider, HookAbort, ProviderEvent,
    SystemProbePort,
};
use vidgrab_core::{
    AppPaths, BenchmarkError, BenchmarkEvent, BenchmarkResult, Measurement, OutputContainer,
    Payload, RetryPolicy, RunOutcome, RunRecord, Settings,
};

const BENCHMARK_FORMAT: &str = "bestvideo+bestaudio/best";
const BENCHMARK_OUTPUT: &str = "benchmark_test.%(ext)s";

/// Runs the worker-count benchmark against a fetch provider.
pub struct NetworkBenchmarkEngine {
    provider: Arc<dyn FetchProvider>,
    probe: Arc<dyn SystemProbePort>,
    paths: AppPaths,
    payload_a_url: String,
    payload_b_url: String,
    ffmpeg_location: Option<PathBuf>,
}

impl NetworkBenchmarkEngine {
    pub fn new(
        provider: Arc<dyn FetchProvider>,
        probe: Arc<dyn SystemProbePort>,
        paths: AppPaths,
    ) -> Self {
        Self {
            provider,
            probe,
            paths,
            payload_a_url: DEFAULT_PAYLOAD_A_URL.to_string(),
            payload_b_url: DEFAULT_PAYLOAD_B_URL.to_string(),
            ffmpeg_location: None,
        }
    }

    /// Take payload URLs from settings, keeping defaults for blank ones.
    #[must_use]
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        if !settings.benchmark_payload_a_url.trim().is_empty() {
            self.payload_a_url = settings.benchmark_payload_a_url.trim().to_string();
        }
        if !settings.benchmark_payload_b_url.trim().is_empty() {
            self.payload_b_url = settings.benchmark_payload_b_url.trim().to_string();
        }
        self
    }

    #[must_use]
    pub fn with_ffmpeg_location(mut self, path: Option<PathBuf>) -> Self {
        self.ffmpeg_location = path;
        self
    }

    fn url_for(&self, payload: Payload) -> &str {
        match payload {
            Payload::A => &self.payload_a_url,
            Payload::B => &self.payload_b_url,
        }
    }

    /// Worker counts this host will be tested with.
    pub fn candidates(&self) -> Vec<u32> {
        candidate_worker_counts(self.probe.cpu_count())
    }

    /// Run every (payload, worker count) combination and analyse the results.
    ///
    /// Failed runs are recorded and skipped; only a benchmark where every run
    /// failed is an error.
    pub async fn run(
        &self,
        emitter: &dyn EventEmitter<BenchmarkEvent>,
        cancel: &CancellationToken,
    ) -> Result<BenchmarkResult, BenchmarkError> {
        let candidates = self.candidates();
        if candidates.is_empty() {
            return Err(BenchmarkError::NoCandidates);
        }

        let scratch_root = self.paths.temp_dir();
        tokio::fs::create_dir_all(&scratch_root).await?;

        let total = candidates.len() * 2;
        info!(cpus = self.probe.cpu_count(), ?candidates, "Starting network benchmark");

        let mut results_a = Vec::with_capacity(candidates.len());
        let mut results_b = Vec::with_capacity(candidates.len());
        let mut index = 0usize;

        for payload in [Payload::A, Payload::B] {
            for &workers in &candidates {
                if cancel.is_cancelled() {
                    return Err(BenchmarkError::Cancelled);
                }

                #[allow(clippy::cast_precision_loss)]
                let percent = index as f64 / total as f64 * 100.0;
                emitter.emit(BenchmarkEvent::Progress { percent });
                emitter.emit(BenchmarkEvent::Status(format!(
                    "Testing payload {} with {workers} worker(s) ({}/{total})",
                    payload.label(),
                    index + 1
                )));

                let outcome = self.run_once(payload, workers, &scratch_root, cancel).await?;
                let record = RunRecord {
                    workers,
                    payload,
                    outcome,
                };
                emitter.emit(BenchmarkEvent::RunFinished(record.clone()));

                match payload {
                    Payload::A => results_a.push(record),
                    Payload::B => results_b.push(record),
                }
                index += 1;
            }
        }

        emitter.emit(BenchmarkEvent::Progress { percent: 100.0 });
        emitter.emit(BenchmarkEvent::Status("Analysing results".to_string()));
        analyze(results_a, results_b)
    }

    /// One timed fetch in its own scratch directory.
    ///
    /// Only cancellation and scratch-directory I/O are errors; provider
    /// failures become [`RunOutcome::Failed`].
    async fn run_once(
        &self,
        payload: Payload,
        workers: u32,
        scratch_root: &Path,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, BenchmarkError> {
        let scratch = tempfile::Builder::new()
            .prefix("benchmark-")
            .tempdir_in(scratch_root)?;
        let options = self.options(&scratch, workers);
        let limit = payload.byte_limit();
        let url = self.url_for(payload);

        debug!(payload = payload.label(), workers, url, "Benchmark run");

        let mut observed = 0u64;
        let hook_cancel = cancel.clone();
        let mut hook = |event: &ProviderEvent| -> Result<(), HookAbort> {
            if hook_cancel.is_cancelled() {
                return Err(HookAbort::Cancelled);
            }
            if let ProviderEvent::Downloading(tick) = event {
                observed = observed.max(tick.downloaded_bytes);
                if let Some(limit) = limit {
                    if tick.downloaded_bytes >= limit {
                        return Err(HookAbort::LimitReached {
                            bytes: tick.downloaded_bytes,
                        });
                    }
                }
            }
            Ok(())
        };

        let started = Instant::now();
        let result = self.provider.fetch(url, &options, &mut hook, cancel).await;
        let elapsed = started.elapsed().as_secs_f64();

        let (bytes, partial) = match result {
            Ok(outcome) => (outcome.bytes_transferred.max(observed), false),
            Err(FetchError::Aborted(HookAbort::LimitReached { bytes })) => (bytes, true),
            Err(e) if e.is_cancellation() => return Err(BenchmarkError::Cancelled),
            Err(e) => {
                warn!(payload = payload.label(), workers, error = %e, "Benchmark run failed");
                return Ok(RunOutcome::Failed {
                    error: e.to_string(),
                });
            }
        };
        drop(scratch);

        #[allow(clippy::cast_precision_loss)]
        let size_mb = bytes as f64 / 1_048_576.0;
        let measurement = Measurement {
            duration_secs: elapsed,
            size_mb,
            speed_mbps: throughput_mbps(bytes, elapsed),
            partial,
        };
        info!(
            payload = payload.label(),
            workers,
            seconds = elapsed,
            size_mb = measurement.size_mb,
            speed_mbps = measurement.speed_mbps,
            partial,
            "Benchmark run finished"
        );
        Ok(RunOutcome::Measured(measurement))
    }

    fn options(&self, scratch: &TempDir, workers: u32) -> FetchOptions {
        FetchOptions {
            format_selector: BENCHMARK_FORMAT.to_string(),
            output_template: scratch
                .path()
                .join(BENCHMARK_OUTPUT)
                .to_string_lossy()
                .into_owned(),
            merge_container: Some(OutputContainer::Mp4),
            concurrent_fragments: workers,
            retries: RetryPolicy::BENCHMARK,
            socket_timeout_secs: Some(DEFAULT_SOCKET_TIMEOUT_SECS),
            temp_dir: Some(scratch.path().to_path_buf()),
            ffmpeg_location: self.ffmpeg_location.clone(),
            ..Default::default()
        }
    }
}

//! Fetch orchestrator.
//!
//! Runs one download end to end: makes sure helper tools exist, resolves
//! metadata for the size estimate, picks a worker count, builds provider
//! options and drives the transfer while relaying progress.
//!
//! # Design Principles
//!
//! - Every external system arrives as a port in [`OrchestratorDeps`]
//! - Settings are passed in by value per call, never read from disk here
//! - Helper tool failures degrade the download, they never abort it
//! - Cancellation is checked by the progress hook and raced against
//!   metadata resolution; the provider also watches the token itself

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vidgrab_core::download::{DEFAULT_SOCKET_TIMEOUT_SECS, rate_limit_from_mbps};
use vidgrab_core::ports::{
    EventEmitter, FetchOptions, FetchProvider, HookAbort, InstallProgress, InstallerPort,
    MediaMetadata, ProviderEvent, SystemProbePort,
};
use vidgrab_core::settings::MAX_CONCURRENT_FRAGMENTS;
use vidgrab_core::{
    AppPaths, CompletedDownload, ConcurrencyAdvisor, DownloadError, DownloadEvent, DownloadJob,
    DownloadRequest, DownloadResult, JobState, RetryPolicy, Settings, WorkerCountDecision,
};

/// Output file name pattern inside the download directory.
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Ports and paths the orchestrator works with.
#[derive(Clone)]
pub struct OrchestratorDeps {
    pub provider: Arc<dyn FetchProvider>,
    /// Installer for the media converter (ffmpeg).
    pub converter_installer: Arc<dyn InstallerPort>,
    /// Installer for the browser-cookie plugin, if cookies from a browser
    /// should be supported.
    pub cookie_plugin_installer: Option<Arc<dyn InstallerPort>>,
    pub probe: Arc<dyn SystemProbePort>,
    pub paths: AppPaths,
}

/// Metadata plus the worker count a download would use.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub metadata: MediaMetadata,
    pub decision: WorkerCountDecision,
}

/// Emits `StateChanged` events, refusing illegal transitions.
struct StateTracker<'a> {
    current: Mutex<JobState>,
    emitter: &'a dyn EventEmitter<DownloadEvent>,
}

impl<'a> StateTracker<'a> {
    fn new(emitter: &'a dyn EventEmitter<DownloadEvent>) -> Self {
        Self {
            current: Mutex::new(JobState::Idle),
            emitter,
        }
    }

    fn set(&self, next: JobState) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if !current.can_transition_to(next) {
            debug!(from = current.as_str(), to = next.as_str(), "Ignoring illegal state change");
            return;
        }
        *current = next;
        drop(current);
        self.emitter.emit(DownloadEvent::state(next));
    }
}

/// Human-readable status line for a progress tick.
fn progress_status(percent: f64, speed: &str, eta: &str) -> String {
    let or_na = |s: &str| if s.is_empty() { "N/A".to_string() } else { s.to_string() };
    format!(
        "Downloading: {percent:.1}% | Speed: {} | ETA: {}",
        or_na(speed),
        or_na(eta)
    )
}

fn mb_to_bytes(mb: u32) -> Option<u64> {
    (mb > 0).then(|| u64::from(mb) * BYTES_PER_MB)
}

/// Coordinates one download at a time over the injected ports.
pub struct FetchOrchestrator {
    deps: OrchestratorDeps,
}

impl FetchOrchestrator {
    pub const fn new(deps: OrchestratorDeps) -> Self {
        Self { deps }
    }

    /// Advisor for the current host and recorded benchmark.
    pub fn advisor(&self, settings: &Settings) -> ConcurrencyAdvisor {
        ConcurrencyAdvisor::from_settings(self.deps.probe.cpu_count(), settings)
    }

    /// Resolve metadata and the worker count a download of `url` would get.
    pub async fn inspect(&self, url: &str, settings: &Settings) -> DownloadResult<Inspection> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadError::invalid_request("URL is empty"));
        }
        let options = self.base_options(settings, settings.default_quality.format_selector());
        let metadata = self.deps.provider.resolve_metadata(url, &options).await?;
        let decision = self.advisor(settings).decide(metadata.size_mb());
        Ok(Inspection { metadata, decision })
    }

    /// Run a download to completion.
    ///
    /// Every state change, progress tick and the final outcome go through
    /// `emitter`. The returned error matches the terminal event.
    pub async fn download(
        &self,
        request: DownloadRequest,
        settings: &Settings,
        emitter: &dyn EventEmitter<DownloadEvent>,
        cancel: CancellationToken,
    ) -> DownloadResult<CompletedDownload> {
        let states = StateTracker::new(emitter);
        let result = self.run(request, settings, emitter, &states, &cancel).await;

        match &result {
            Ok(done) => {
                states.set(JobState::Completed);
                info!(url = %done.url, bytes = done.bytes_transferred, "Download complete");
                emitter.emit(DownloadEvent::Completed {
                    url: done.url.clone(),
                    title: done.title.clone(),
                });
            }
            Err(e) if e.is_cancelled() => {
                states.set(JobState::Cancelled);
                info!("Download cancelled");
                emitter.emit(DownloadEvent::Cancelled);
            }
            Err(e) => {
                states.set(JobState::Failed);
                warn!(error = %e, "Download failed");
                emitter.emit(DownloadEvent::Failed {
                    message: e.user_message(),
                });
            }
        }
        result
    }

    async fn run(
        &self,
        request: DownloadRequest,
        settings: &Settings,
        emitter: &dyn EventEmitter<DownloadEvent>,
        states: &StateTracker<'_>,
        cancel: &CancellationToken,
    ) -> DownloadResult<CompletedDownload> {
        let url = request.url.trim().to_string();
        if url.is_empty() {
            return Err(DownloadError::invalid_request("URL is empty"));
        }
        if cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        let output_dir = prepare_output_dir(&settings.download_path).await?;
        states.set(JobState::ResolvingMetadata);

        // Step 1: helper tools
        let ffmpeg = self.ensure_tools(settings, emitter).await;

        // Step 2: format selection
        let quality = request.quality.unwrap_or(settings.default_quality);
        let container = request.container.unwrap_or(settings.default_format);
        let format_selector = quality.format_selector();

        // Step 3: size estimate
        emitter.emit(DownloadEvent::status("Resolving video information..."));
        let probe_options = self.base_options(settings, format_selector.clone());
        let metadata = tokio::select! {
            () = cancel.cancelled() => return Err(DownloadError::Cancelled),
            meta = self.deps.provider.resolve_metadata(&url, &probe_options) => meta,
        };
        let metadata = match metadata {
            Ok(meta) => Some(meta),
            Err(e) if e.is_cancellation() => return Err(DownloadError::Cancelled),
            Err(e) => {
                warn!(url = %url, error = %e, "Could not resolve metadata, size unknown");
                None
            }
        };
        let size_mb = metadata.as_ref().and_then(MediaMetadata::size_mb);
        let title = metadata.and_then(|m| m.title);

        // Step 4: worker count
        let concurrency = self.worker_count(&request, settings, size_mb);

        // Step 5: provider options
        let speed_limit = request.speed_limit_mbps.unwrap_or(settings.speed_limit_mbps);
        let job = DownloadJob {
            url,
            quality,
            container,
            format_selector,
            concurrency,
            rate_limit_bytes_per_sec: rate_limit_from_mbps(speed_limit),
            retries: RetryPolicy::GENEROUS,
            socket_timeout_secs: DEFAULT_SOCKET_TIMEOUT_SECS,
            cancel: cancel.clone(),
        };
        let options = self.fetch_options(&job, settings, &output_dir, ffmpeg);

        info!(
            url = %job.url,
            quality = %job.quality,
            container = job.container.as_str(),
            workers = job.concurrency,
            rate_limit = ?job.rate_limit_bytes_per_sec,
            "Starting download"
        );

        // Step 6: transfer
        states.set(JobState::Downloading);
        emitter.emit(DownloadEvent::status(format!(
            "Starting download with {} parallel fragments",
            job.concurrency
        )));

        let hook_cancel = job.cancel.clone();
        let mut hook = move |event: &ProviderEvent| -> Result<(), HookAbort> {
            if hook_cancel.is_cancelled() {
                return Err(HookAbort::Cancelled);
            }
            match event {
                ProviderEvent::Downloading(tick) => {
                    emitter.emit(DownloadEvent::Progress {
                        percent: tick.percent,
                        speed: tick.speed.clone(),
                        eta: tick.eta.clone(),
                    });
                    emitter.emit(DownloadEvent::status(progress_status(
                        tick.percent,
                        &tick.speed,
                        &tick.eta,
                    )));
                }
                ProviderEvent::Finished { .. } => {
                    emitter.emit(DownloadEvent::Progress {
                        percent: 100.0,
                        speed: String::new(),
                        eta: String::new(),
                    });
                    emitter.emit(DownloadEvent::status("Download complete. Processing..."));
                }
            }
            Ok(())
        };

        let outcome = self
            .deps
            .provider
            .fetch(&job.url, &options, &mut hook, &job.cancel)
            .await?;

        Ok(CompletedDownload {
            url: job.url,
            title,
            output_dir,
            concurrency: job.concurrency,
            bytes_transferred: outcome.bytes_transferred,
        })
    }

    /// Ensure ffmpeg (and the cookie plugin when needed) are present.
    ///
    /// Returns the ffmpeg location, or `None` when it could not be provided.
    async fn ensure_tools(
        &self,
        settings: &Settings,
        emitter: &dyn EventEmitter<DownloadEvent>,
    ) -> Option<PathBuf> {
        let relay = |progress: InstallProgress| {
            if let InstallProgress::Status(message) = progress {
                emitter.emit(DownloadEvent::status(message));
            }
        };

        let installer = &self.deps.converter_installer;
        let ffmpeg = match installer.ensure(&relay).await {
            Ok(path) => {
                debug!(tool = installer.name(), path = %path.display(), "Tool ready");
                Some(path)
            }
            Err(e) => {
                warn!(tool = installer.name(), error = %e, "Tool unavailable, continuing without it");
                emitter.emit(DownloadEvent::status(format!(
                    "Warning: {} unavailable ({e}); streams may not be merged",
                    installer.name()
                )));
                None
            }
        };

        if settings.uses_browser_cookies() {
            if let Some(plugin) = &self.deps.cookie_plugin_installer {
                if let Err(e) = plugin.ensure(&relay).await {
                    warn!(tool = plugin.name(), error = %e, "Cookie plugin unavailable");
                    emitter.emit(DownloadEvent::status(format!(
                        "Warning: {} unavailable ({e}); browser cookies may fail",
                        plugin.name()
                    )));
                }
            }
        }

        ffmpeg
    }

    fn worker_count(
        &self,
        request: &DownloadRequest,
        settings: &Settings,
        size_mb: Option<f64>,
    ) -> u32 {
        if let Some(workers) = request.workers {
            return workers.clamp(1, MAX_CONCURRENT_FRAGMENTS);
        }
        if settings.auto_concurrency {
            return self.advisor(settings).decide(size_mb).workers;
        }
        settings.concurrent_fragments.clamp(1, MAX_CONCURRENT_FRAGMENTS)
    }

    /// Options shared by metadata and download calls.
    fn base_options(&self, settings: &Settings, format_selector: String) -> FetchOptions {
        FetchOptions {
            format_selector,
            socket_timeout_secs: Some(DEFAULT_SOCKET_TIMEOUT_SECS),
            cache_dir: Some(self.deps.paths.cache_dir()),
            cookies: settings.cookie_source(),
            ..Default::default()
        }
    }

    fn fetch_options(
        &self,
        job: &DownloadJob,
        settings: &Settings,
        output_dir: &Path,
        ffmpeg: Option<PathBuf>,
    ) -> FetchOptions {
        FetchOptions {
            output_template: output_dir.join(OUTPUT_TEMPLATE).to_string_lossy().into_owned(),
            merge_container: Some(job.container),
            concurrent_fragments: job.concurrency,
            retries: job.retries,
            socket_timeout_secs: Some(job.socket_timeout_secs),
            rate_limit_bytes_per_sec: job.rate_limit_bytes_per_sec,
            http_chunk_size_bytes: mb_to_bytes(settings.chunk_size_mb),
            buffer_size_bytes: mb_to_bytes(settings.buffer_size_mb),
            temp_dir: Some(self.deps.paths.temp_dir()),
            ffmpeg_location: ffmpeg,
            keep_original: settings.keep_original,
            ..self.base_options(settings, job.format_selector.clone())
        }
    }
}

async fn prepare_output_dir(download_path: &str) -> DownloadResult<PathBuf> {
    let trimmed = download_path.trim();
    if trimmed.is_empty() {
        return Err(DownloadError::invalid_request("download path is empty"));
    }
    let dir = PathBuf::from(trimmed);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| DownloadError::from_io_error(&e))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        FakeProvider, FakeRun, FixedProbe, RecordingEmitter, StubInstaller, finished, tick,
    };
    use tempfile::TempDir;
    use vidgrab_core::{OutputContainer, QualityTier};

    struct Fixture {
        _dir: TempDir,
        provider: Arc<FakeProvider>,
        ffmpeg: Arc<StubInstaller>,
        plugin: Arc<StubInstaller>,
        orchestrator: FetchOrchestrator,
        settings: Settings,
    }

    fn fixture(
        metadata: Result<MediaMetadata, String>,
        runs: Vec<FakeRun>,
        ffmpeg: StubInstaller,
        cpus: u32,
    ) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeProvider::new(metadata, runs));
        let ffmpeg = Arc::new(ffmpeg);
        let plugin = Arc::new(StubInstaller::ok("/plugins"));
        let orchestrator = FetchOrchestrator::new(OrchestratorDeps {
            provider: provider.clone(),
            converter_installer: ffmpeg.clone(),
            cookie_plugin_installer: Some(plugin.clone()),
            probe: Arc::new(FixedProbe(cpus)),
            paths: AppPaths::with_root(dir.path().join("config")),
        });
        let mut settings = Settings::with_defaults();
        settings.download_path = dir.path().join("out").to_string_lossy().into_owned();
        Fixture {
            _dir: dir,
            provider,
            ffmpeg,
            plugin,
            orchestrator,
            settings,
        }
    }

    fn sized(mb: u64) -> Result<MediaMetadata, String> {
        Ok(MediaMetadata {
            title: Some("Clip".to_string()),
            size_bytes: Some(mb * BYTES_PER_MB),
            ..Default::default()
        })
    }

    fn states(events: &[DownloadEvent]) -> Vec<JobState> {
        events
            .iter()
            .filter_map(|e| match e {
                DownloadEvent::StateChanged { state } => Some(*state),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_successful_download() {
        let fx = fixture(
            sized(500),
            vec![FakeRun::Events(vec![tick(50, 100), tick(100, 100), finished()])],
            StubInstaller::ok("/usr/bin/ffmpeg"),
            4,
        );
        let emitter = RecordingEmitter::new();

        let done = fx
            .orchestrator
            .download(
                DownloadRequest::new("https://example.com/v").with_quality(QualityTier::P720),
                &fx.settings,
                &emitter,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(done.title.as_deref(), Some("Clip"));
        assert_eq!(done.bytes_transferred, 100);
        assert_eq!(done.concurrency, 5);

        let events = emitter.events();
        assert_eq!(
            states(&events),
            vec![
                JobState::ResolvingMetadata,
                JobState::Downloading,
                JobState::Completed
            ]
        );
        assert!(events.contains(&DownloadEvent::status("Download complete. Processing...")));
        assert!(events.contains(&DownloadEvent::status(
            "Downloading: 50.0% | Speed: 1.00MiB/s | ETA: 00:10"
        )));
        assert!(matches!(events.last(), Some(DownloadEvent::Completed { .. })));

        let options = &fx.provider.seen_options()[0];
        assert_eq!(
            options.format_selector,
            "bestvideo[height<=720]+bestaudio/best[height<=720]/best"
        );
        assert_eq!(options.merge_container, Some(OutputContainer::Mp4));
        assert_eq!(options.retries, RetryPolicy::GENEROUS);
        assert_eq!(options.socket_timeout_secs, Some(30));
        assert_eq!(options.rate_limit_bytes_per_sec, None);
        assert_eq!(options.ffmpeg_location, Some(PathBuf::from("/usr/bin/ffmpeg")));
        assert!(options.output_template.ends_with(OUTPUT_TEMPLATE));
    }

    #[tokio::test]
    async fn test_cancellation_mid_transfer() {
        let cancel = CancellationToken::new();
        let fx = fixture(
            sized(100),
            vec![FakeRun::CancelMidway(cancel.clone())],
            StubInstaller::ok("/usr/bin/ffmpeg"),
            4,
        );
        let emitter = RecordingEmitter::new();

        let err = fx
            .orchestrator
            .download(
                DownloadRequest::new("https://example.com/v"),
                &fx.settings,
                &emitter,
                cancel,
            )
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        let events = emitter.events();
        assert_eq!(states(&events).last(), Some(&JobState::Cancelled));
        assert_eq!(events.last(), Some(&DownloadEvent::Cancelled));
        let progress_ticks = events
            .iter()
            .filter(|e| matches!(e, DownloadEvent::Progress { .. }))
            .count();
        assert_eq!(progress_ticks, 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let fx = fixture(sized(100), vec![], StubInstaller::ok("/x"), 4);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = fx
            .orchestrator
            .download(
                DownloadRequest::new("https://example.com/v"),
                &fx.settings,
                &RecordingEmitter::new(),
                cancel,
            )
            .await
            .unwrap_err();
        assert_eq!(err, DownloadError::Cancelled);
        assert!(fx.provider.seen_options().is_empty());
    }

    #[tokio::test]
    async fn test_metadata_failure_uses_governing_maximum() {
        let fx = fixture(
            Err("boom".to_string()),
            vec![FakeRun::Events(vec![finished()])],
            StubInstaller::ok("/x"),
            8,
        );
        let done = fx
            .orchestrator
            .download(
                DownloadRequest::new("https://example.com/v"),
                &fx.settings,
                &RecordingEmitter::new(),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(done.concurrency, 8);
        assert_eq!(done.title, None);
    }

    #[tokio::test]
    async fn test_installer_failure_is_not_fatal() {
        let fx = fixture(
            sized(10),
            vec![FakeRun::Events(vec![finished()])],
            StubInstaller::failing("no network"),
            4,
        );
        let emitter = RecordingEmitter::new();
        fx.orchestrator
            .download(
                DownloadRequest::new("https://example.com/v"),
                &fx.settings,
                &emitter,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(fx.provider.seen_options()[0].ffmpeg_location, None);
        assert!(emitter.events().iter().any(|e| matches!(
            e,
            DownloadEvent::Status { message } if message.starts_with("Warning:")
        )));
    }

    #[tokio::test]
    async fn test_manual_and_requested_worker_counts() {
        let mut fx = fixture(
            sized(1000),
            vec![
                FakeRun::Events(vec![finished()]),
                FakeRun::Events(vec![finished()]),
            ],
            StubInstaller::ok("/x"),
            8,
        );
        fx.settings.auto_concurrency = false;
        fx.settings.concurrent_fragments = 3;
        fx.settings.speed_limit_mbps = 8.0;

        let manual = fx
            .orchestrator
            .download(
                DownloadRequest::new("https://example.com/v"),
                &fx.settings,
                &RecordingEmitter::new(),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(manual.concurrency, 3);
        assert_eq!(
            fx.provider.seen_options()[0].rate_limit_bytes_per_sec,
            Some(1_048_576)
        );

        let requested = fx
            .orchestrator
            .download(
                DownloadRequest::new("https://example.com/v")
                    .with_workers(12)
                    .with_speed_limit_mbps(0.0),
                &fx.settings,
                &RecordingEmitter::new(),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(requested.concurrency, 12);
        assert_eq!(fx.provider.seen_options()[1].rate_limit_bytes_per_sec, None);
    }

    #[tokio::test]
    async fn test_provider_failure_emits_failed() {
        let fx = fixture(
            sized(10),
            vec![FakeRun::Fail(vec![tick(5, 10)], "HTTP Error 403".to_string())],
            StubInstaller::ok("/x"),
            4,
        );
        let emitter = RecordingEmitter::new();
        let err = fx
            .orchestrator
            .download(
                DownloadRequest::new("https://example.com/v"),
                &fx.settings,
                &emitter,
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Transfer { .. }));
        let events = emitter.events();
        assert_eq!(states(&events).last(), Some(&JobState::Failed));
        assert!(matches!(events.last(), Some(DownloadEvent::Failed { .. })));
    }

    #[tokio::test]
    async fn test_cookie_plugin_only_for_browser_cookies() {
        let mut fx = fixture(
            sized(10),
            vec![
                FakeRun::Events(vec![finished()]),
                FakeRun::Events(vec![finished()]),
            ],
            StubInstaller::ok("/x"),
            4,
        );
        let request = || DownloadRequest::new("https://example.com/v");

        fx.orchestrator
            .download(request(), &fx.settings, &RecordingEmitter::new(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(fx.plugin.call_count(), 0);

        fx.settings.cookies_enabled = true;
        fx.settings.cookies_browser = "chrome".to_string();
        fx.orchestrator
            .download(request(), &fx.settings, &RecordingEmitter::new(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(fx.plugin.call_count(), 1);
        assert_eq!(fx.ffmpeg.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_url_rejected() {
        let fx = fixture(sized(10), vec![], StubInstaller::ok("/x"), 4);
        let emitter = RecordingEmitter::new();
        let err = fx
            .orchestrator
            .download(
                DownloadRequest::new("   "),
                &fx.settings,
                &emitter,
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidRequest { .. }));
        assert_eq!(states(&emitter.events()), vec![JobState::Failed]);
    }

    #[tokio::test]
    async fn test_inspect_reports_decision() {
        let mut fx = fixture(sized(500), vec![], StubInstaller::ok("/x"), 8);
        fx.settings.benchmark_completed = true;
        fx.settings.benchmark_optimal_workers = Some(3);
        fx.settings.benchmark_min_size_per_worker = Some(80);

        let inspection = fx
            .orchestrator
            .inspect("https://example.com/v", &fx.settings)
            .await
            .unwrap();
        assert_eq!(inspection.decision.workers, 3);
        assert_eq!(inspection.metadata.title.as_deref(), Some("Clip"));
    }
}

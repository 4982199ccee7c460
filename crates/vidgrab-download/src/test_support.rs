//! Hand-written fake ports shared by the orchestrator and benchmark tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use vidgrab_core::ports::{
    EventEmitter, FetchError, FetchOptions, FetchOutcome, FetchProvider, InstallError,
    InstallerPort, MediaMetadata, ProgressFn, ProgressHook, ProgressTick, ProviderEvent,
    SystemProbePort,
};

/// Scripted behaviour for one `fetch` call.
pub enum FakeRun {
    /// Emit these events, then succeed.
    Events(Vec<ProviderEvent>),
    /// Emit these events, then fail with this message.
    Fail(Vec<ProviderEvent>, String),
    /// Emit one event, cancel the token, then emit another.
    CancelMidway(CancellationToken),
}

/// Fake provider that replays scripted runs and records the options it saw.
pub struct FakeProvider {
    metadata: Result<MediaMetadata, String>,
    runs: Mutex<VecDeque<FakeRun>>,
    pub seen: Mutex<Vec<(String, FetchOptions)>>,
}

impl FakeProvider {
    pub fn new(metadata: Result<MediaMetadata, String>, runs: Vec<FakeRun>) -> Self {
        Self {
            metadata,
            runs: Mutex::new(runs.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen_options(&self) -> Vec<FetchOptions> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|(_, o)| o.clone())
            .collect()
    }
}

pub fn tick(downloaded_bytes: u64, total: u64) -> ProviderEvent {
    #[allow(clippy::cast_precision_loss)]
    let percent = downloaded_bytes as f64 / total as f64 * 100.0;
    ProviderEvent::Downloading(ProgressTick {
        downloaded_bytes,
        total_bytes: Some(total),
        percent,
        speed: "1.00MiB/s".to_string(),
        eta: "00:10".to_string(),
    })
}

pub fn finished() -> ProviderEvent {
    ProviderEvent::Finished {
        filename: Some("clip.mp4".to_string()),
    }
}

fn last_bytes(events: &[ProviderEvent]) -> u64 {
    events
        .iter()
        .filter_map(|e| match e {
            ProviderEvent::Downloading(t) => Some(t.downloaded_bytes),
            ProviderEvent::Finished { .. } => None,
        })
        .max()
        .unwrap_or(0)
}

fn replay(events: &[ProviderEvent], hook: &mut ProgressHook<'_>) -> Result<(), FetchError> {
    for event in events {
        hook(event).map_err(FetchError::Aborted)?;
    }
    Ok(())
}

#[async_trait]
impl FetchProvider for FakeProvider {
    async fn resolve_metadata(
        &self,
        _url: &str,
        _options: &FetchOptions,
    ) -> Result<MediaMetadata, FetchError> {
        self.metadata.clone().map_err(FetchError::ProcessFailed)
    }

    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
        hook: &mut ProgressHook<'_>,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, FetchError> {
        self.seen
            .lock()
            .unwrap()
            .push((url.to_string(), options.clone()));
        let run = self.runs.lock().unwrap().pop_front();

        match run {
            None => Ok(FetchOutcome::default()),
            Some(FakeRun::Events(events)) => {
                replay(&events, hook)?;
                Ok(FetchOutcome {
                    bytes_transferred: last_bytes(&events),
                    filename: Some("clip.mp4".to_string()),
                })
            }
            Some(FakeRun::Fail(events, message)) => {
                replay(&events, hook)?;
                Err(FetchError::ProcessFailed(message))
            }
            Some(FakeRun::CancelMidway(token)) => {
                hook(&tick(10, 100)).map_err(FetchError::Aborted)?;
                token.cancel();
                hook(&tick(20, 100)).map_err(FetchError::Aborted)?;
                if cancel.is_cancelled() {
                    return Err(FetchError::Cancelled);
                }
                Ok(FetchOutcome::default())
            }
        }
    }
}

/// Installer that always succeeds or always fails.
pub struct StubInstaller {
    pub result: Result<PathBuf, String>,
    pub calls: Mutex<u32>,
}

impl StubInstaller {
    pub fn ok(path: &str) -> Self {
        Self {
            result: Ok(PathBuf::from(path)),
            calls: Mutex::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl InstallerPort for StubInstaller {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn locate(&self) -> Option<PathBuf> {
        self.result.clone().ok()
    }

    async fn ensure(&self, _progress: ProgressFn<'_>) -> Result<PathBuf, InstallError> {
        *self.calls.lock().unwrap() += 1;
        self.result.clone().map_err(InstallError::Download)
    }
}

pub struct FixedProbe(pub u32);

impl SystemProbePort for FixedProbe {
    fn cpu_count(&self) -> u32 {
        self.0
    }

    fn platform(&self) -> &'static str {
        "test"
    }
}

/// Emitter that keeps every event.
pub struct RecordingEmitter<E> {
    events: Mutex<Vec<E>>,
}

impl<E: Clone> RecordingEmitter<E> {
    pub const fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<E> {
        self.events.lock().unwrap().clone()
    }
}

impl<E: Send> EventEmitter<E> for RecordingEmitter<E> {
    fn emit(&self, event: E) {
        self.events.lock().unwrap().push(event);
    }
}

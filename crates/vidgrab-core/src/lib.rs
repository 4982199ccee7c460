//! Core domain for vidgrab.
//!
//! Pure types, the worker-count advisor, benchmark analysis and the port
//! traits that adapters (`vidgrab-runtime`, `vidgrab-download`) implement.
//! Nothing in this crate spawns processes or touches the network.

#![deny(unused_crate_dependencies)]

pub mod benchmark;
pub mod concurrency;
pub mod download;
pub mod paths;
pub mod ports;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use benchmark::{
    BenchmarkError, BenchmarkEvent, BenchmarkResult, CombinedThroughput, Measurement, Payload,
    RunOutcome, RunRecord,
};
pub use concurrency::{
    BenchmarkCalibration, ConcurrencyAdvisor, DEFAULT_MIN_SIZE_PER_WORKER_MB, DecisionSource,
    WorkerCountDecision,
};
pub use download::{
    CompletedDownload, DownloadError, DownloadEvent, DownloadJob, DownloadRequest, DownloadResult,
    JobState, OutputContainer, QualityTier, RetryPolicy,
};
pub use paths::{AppPaths, PathError};
pub use ports::{
    ChannelEmitter, CookieSource, EventEmitter, FetchError, FetchOptions, FetchOutcome,
    FetchProvider, FormatInfo, HookAbort, InstallError, InstallProgress, InstallerPort,
    MediaMetadata, NoopEmitter, ProgressHook, ProgressTick, ProviderEvent, SettingsRepository,
    SettingsStoreError, SystemProbePort,
};
pub use services::{SettingsService, SettingsServiceError};
pub use settings::{
    Settings, SettingsError, SettingsUpdate, validate_benchmark_fields, validate_settings,
};

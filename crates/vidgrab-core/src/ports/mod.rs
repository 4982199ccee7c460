//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No subprocess or HTTP types in any signature
//! - Cancellation travels as a `CancellationToken`, progress as plain events
//! - Adapters live in `vidgrab-runtime` and `vidgrab-download`

pub mod event_emitter;
pub mod fetch_provider;
pub mod installer;
pub mod settings_repository;
pub mod system_probe;

pub use event_emitter::{ChannelEmitter, EventEmitter, NoopEmitter};
pub use fetch_provider::{
    CookieSource, FetchError, FetchOptions, FetchOutcome, FetchProvider, FormatInfo, HookAbort,
    MediaMetadata, ProgressHook, ProgressTick, ProviderEvent,
};
pub use installer::{InstallError, InstallProgress, InstallerPort, ProgressFn};
pub use settings_repository::{SettingsRepository, SettingsStoreError};
pub use system_probe::SystemProbePort;

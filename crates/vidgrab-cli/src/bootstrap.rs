//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter. All concrete implementations are instantiated here:
//! - Settings store and service (via vidgrab-runtime / vidgrab-core)
//! - System probe and tool installers (via vidgrab-runtime)
//! - yt-dlp provider, orchestrator and benchmark engine (via vidgrab-download)
//!
//! The yt-dlp provider is resolved per command, so commands that never
//! download (`config`, `paths`) work without it installed.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;
use vidgrab_core::ports::{InstallerPort, SystemProbePort};
use vidgrab_core::{AppPaths, FetchError, PathError, Settings, SettingsService};
use vidgrab_download::{FetchOrchestrator, NetworkBenchmarkEngine, OrchestratorDeps, YtDlpProvider};
use vidgrab_runtime::{CookiePluginInstaller, DefaultSystemProbe, FfmpegInstaller, JsonSettingsStore};

use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub paths: AppPaths,
}

impl CliConfig {
    /// Create config from the environment and platform defaults.
    pub fn with_defaults() -> Result<Self, PathError> {
        Ok(Self {
            paths: AppPaths::resolve()?,
        })
    }

    /// Use `dir` as the configuration directory when given.
    #[must_use]
    pub fn with_config_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.paths = self.paths.with_config_dir(dir);
        }
        self
    }
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    paths: AppPaths,
    settings: SettingsService,
    probe: Arc<dyn SystemProbePort>,
    ffmpeg: Arc<dyn InstallerPort>,
    cookie_plugin: Arc<dyn InstallerPort>,
}

impl CliContext {
    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// Access the settings service.
    pub fn settings(&self) -> &SettingsService {
        &self.settings
    }

    pub fn probe(&self) -> &Arc<dyn SystemProbePort> {
        &self.probe
    }

    /// Access the ffmpeg installer.
    pub fn ffmpeg(&self) -> &Arc<dyn InstallerPort> {
        &self.ffmpeg
    }

    /// Access the cookie plugin installer.
    pub fn cookie_plugin(&self) -> &Arc<dyn InstallerPort> {
        &self.cookie_plugin
    }

    /// Locate yt-dlp, honouring a configured `ytdlp_path`.
    pub fn ytdlp(&self, settings: &Settings) -> Result<YtDlpProvider, FetchError> {
        let provider = YtDlpProvider::discover(settings.ytdlp_override())?;
        debug!(binary = %provider.binary().display(), "yt-dlp resolved");
        Ok(provider)
    }

    /// Build the download orchestrator for the current settings.
    pub fn orchestrator(&self, settings: &Settings) -> Result<FetchOrchestrator, CliError> {
        let provider = self.ytdlp(settings)?;
        Ok(FetchOrchestrator::new(OrchestratorDeps {
            provider: Arc::new(provider),
            converter_installer: self.ffmpeg.clone(),
            cookie_plugin_installer: Some(self.cookie_plugin.clone()),
            probe: self.probe.clone(),
            paths: self.paths.clone(),
        }))
    }

    /// Build the benchmark engine, with payload URLs taken from settings.
    pub fn benchmark_engine(&self, settings: &Settings) -> Result<NetworkBenchmarkEngine, CliError> {
        let provider = self.ytdlp(settings)?;
        Ok(
            NetworkBenchmarkEngine::new(Arc::new(provider), self.probe.clone(), self.paths.clone())
                .with_settings(settings),
        )
    }
}

/// Bootstrap the CLI application.
///
/// This is the composition root. It:
/// 1. Creates the config, cache and temp directories
/// 2. Opens the JSON settings store behind the settings service
/// 3. Creates the system probe and the tool installers
pub async fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let CliConfig { paths } = config;
    paths.ensure_all().map_err(CliError::from)?;

    let store = Arc::new(JsonSettingsStore::new(paths.settings_file()));
    let settings = SettingsService::new(store);

    // Surface a broken settings file once at startup rather than per command
    settings.get().await.map_err(CliError::from)?;

    let ffmpeg: Arc<dyn InstallerPort> =
        Arc::new(FfmpegInstaller::new(paths.clone(), settings.clone()));
    let cookie_plugin: Arc<dyn InstallerPort> =
        Arc::new(CookiePluginInstaller::new(paths.plugin_dir()));

    debug!(config_dir = %paths.config_dir().display(), "CLI context ready");

    Ok(CliContext {
        paths,
        settings,
        probe: Arc::new(DefaultSystemProbe::new()),
        ffmpeg,
        cookie_plugin,
    })
}

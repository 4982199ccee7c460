//! ffmpeg locator and installer.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use vidgrab_core::ports::{InstallError, InstallProgress, InstallerPort, ProgressFn};
use vidgrab_core::{AppPaths, SettingsService, SettingsUpdate};

use super::archive::{
    TempArchive, download_to_file, extract_bin_from_tar_xz, extract_bin_from_zip,
};

const WINDOWS_URL: &str =
    "https://github.com/BtbN/FFmpeg-Builds/releases/download/latest/ffmpeg-master-latest-win64-gpl.zip";
const LINUX_URL: &str = "https://github.com/BtbN/FFmpeg-Builds/releases/download/latest/ffmpeg-master-latest-linux64-gpl.tar.xz";
const MACOS_URL: &str = "https://evermeet.cx/ffmpeg/getrelease/ffmpeg/zip";

/// How long a `-version` probe may take before the binary is considered broken.
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(target_os = "windows")]
const BINARY_NAME: &str = "ffmpeg.exe";
#[cfg(not(target_os = "windows"))]
const BINARY_NAME: &str = "ffmpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarXz,
}

impl ArchiveKind {
    const fn file_name(self) -> &'static str {
        match self {
            Self::Zip => "ffmpeg.zip",
            Self::TarXz => "ffmpeg.tar.xz",
        }
    }
}

/// Where to download an ffmpeg build from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSource {
    pub url: String,
    pub kind: ArchiveKind,
}

impl ArchiveSource {
    /// Build for the platform this binary was compiled for.
    pub fn for_current_platform() -> Result<Self, InstallError> {
        Self::for_os(std::env::consts::OS)
    }

    pub fn for_os(os: &str) -> Result<Self, InstallError> {
        let (url, kind) = match os {
            "windows" => (WINDOWS_URL, ArchiveKind::Zip),
            "linux" => (LINUX_URL, ArchiveKind::TarXz),
            "macos" => (MACOS_URL, ArchiveKind::Zip),
            other => return Err(InstallError::UnsupportedPlatform(other.to_string())),
        };
        Ok(Self {
            url: url.to_string(),
            kind,
        })
    }
}

/// Check that `path` runs and exits cleanly with `-version`.
pub async fn responds_to_version(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let mut cmd = tokio::process::Command::new(path);
    cmd.arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match tokio::time::timeout(VERSION_PROBE_TIMEOUT, cmd.status()).await {
        Ok(Ok(status)) => status.success(),
        Ok(Err(e)) => {
            debug!(path = %path.display(), error = %e, "ffmpeg probe failed to start");
            false
        }
        Err(_) => {
            debug!(path = %path.display(), "ffmpeg probe timed out");
            false
        }
    }
}

/// Finds ffmpeg, downloading a static build when none is available.
///
/// Search order: configured path, `PATH`, the local install under the
/// config dir. A fresh install is recorded in settings.
pub struct FfmpegInstaller {
    paths: AppPaths,
    settings: SettingsService,
    client: reqwest::Client,
    source: Option<ArchiveSource>,
}

impl FfmpegInstaller {
    pub fn new(paths: AppPaths, settings: SettingsService) -> Self {
        Self {
            paths,
            settings,
            client: reqwest::Client::new(),
            source: None,
        }
    }

    /// Download from `source` instead of the platform default.
    #[must_use]
    pub fn with_source(mut self, source: ArchiveSource) -> Self {
        self.source = Some(source);
        self
    }

    /// `<config>/ffmpeg/bin/ffmpeg[.exe]`.
    pub fn local_binary_path(&self) -> PathBuf {
        self.paths.tools_dir().join("bin").join(BINARY_NAME)
    }

    async fn configured_path(&self) -> Option<PathBuf> {
        let settings = match self.settings.get().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Cannot read settings while locating ffmpeg");
                return None;
            }
        };
        settings.ffmpeg_override()
    }

    async fn install(&self, progress: ProgressFn<'_>) -> Result<PathBuf, InstallError> {
        let source = match &self.source {
            Some(source) => source.clone(),
            None => ArchiveSource::for_current_platform()?,
        };
        let tools_dir = self.paths.tools_dir();
        tokio::fs::create_dir_all(&tools_dir).await?;

        info!(url = %source.url, "Downloading ffmpeg");
        progress(InstallProgress::Status("Downloading ffmpeg".to_string()));

        let archive = TempArchive::new(tools_dir.join(source.kind.file_name()));
        download_to_file(&self.client, &source.url, archive.path(), progress).await?;

        progress(InstallProgress::Extracting);
        let archive_path = archive.path().to_path_buf();
        let bin_dir = tools_dir.join("bin");
        let kind = source.kind;
        let extracted = tokio::task::spawn_blocking(move || match kind {
            ArchiveKind::Zip => extract_bin_from_zip(&archive_path, &bin_dir, BINARY_NAME),
            ArchiveKind::TarXz => extract_bin_from_tar_xz(&archive_path, &bin_dir, BINARY_NAME),
        })
        .await
        .map_err(|e| InstallError::Extraction(e.to_string()))??;
        drop(archive);

        debug!(files = extracted.len(), "ffmpeg archive extracted");

        let binary = self.local_binary_path();
        if !binary.is_file() {
            return Err(InstallError::Verification(format!(
                "{} not found after extraction",
                binary.display()
            )));
        }

        self.persist(&binary).await;
        info!(path = %binary.display(), "ffmpeg installed");
        Ok(binary)
    }

    async fn persist(&self, binary: &Path) {
        let update = SettingsUpdate {
            ffmpeg_path: Some(binary.to_string_lossy().into_owned()),
            ..Default::default()
        };
        // The local install is found again on the next lookup even if this fails.
        if let Err(e) = self.settings.update(update).await {
            warn!(error = %e, "Could not record ffmpeg path in settings");
        }
    }
}

#[async_trait]
impl InstallerPort for FfmpegInstaller {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn locate(&self) -> Option<PathBuf> {
        if let Some(configured) = self.configured_path().await {
            if responds_to_version(&configured).await {
                debug!(path = %configured.display(), "Using configured ffmpeg");
                return Some(configured);
            }
            warn!(path = %configured.display(), "Configured ffmpeg does not run, searching elsewhere");
        }

        if let Ok(found) = which::which("ffmpeg") {
            debug!(path = %found.display(), "Using ffmpeg from PATH");
            return Some(found);
        }

        let local = self.local_binary_path();
        if responds_to_version(&local).await {
            debug!(path = %local.display(), "Using locally installed ffmpeg");
            return Some(local);
        }

        None
    }

    async fn ensure(&self, progress: ProgressFn<'_>) -> Result<PathBuf, InstallError> {
        if let Some(found) = self.locate().await {
            return Ok(found);
        }
        info!("ffmpeg not found, installing");
        self.install(progress).await
    }
}

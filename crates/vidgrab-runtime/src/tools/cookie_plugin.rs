//! Installer for the ChromeCookieUnlock yt-dlp plugin.
//!
//! Recent Chrome builds lock their cookie database while running; the plugin
//! lets yt-dlp read it anyway. Only needed when cookies come from a browser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use vidgrab_core::ports::{InstallError, InstallProgress, InstallerPort, ProgressFn};

use super::archive::{TempArchive, download_to_file, extract_zip_subtree};

const PLUGIN_ZIP_URL: &str =
    "https://github.com/seproDev/yt-dlp-ChromeCookieUnlock/archive/refs/heads/main.zip";
const PLUGIN_PACKAGE: &str = "yt_dlp_plugins";
const TEMP_ZIP_NAME: &str = "temp_plugin.zip";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

pub struct CookiePluginInstaller {
    plugin_dir: PathBuf,
    url: String,
    client: reqwest::Client,
}

impl CookiePluginInstaller {
    /// Install into `plugin_dir` (the directory yt-dlp scans for plugins).
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            plugin_dir: plugin_dir.into(),
            url: PLUGIN_ZIP_URL.to_string(),
            client,
        }
    }

    /// Download from `url` instead of the upstream repository archive.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// File whose presence means the plugin is installed.
    pub fn marker_file(&self) -> PathBuf {
        self.plugin_dir
            .join(PLUGIN_PACKAGE)
            .join("postprocessor")
            .join("chromecookieunlock.py")
    }

    fn package_dir(&self) -> PathBuf {
        self.plugin_dir.join(PLUGIN_PACKAGE)
    }

    fn is_installed(&self) -> bool {
        self.marker_file().is_file()
    }

    async fn install(&self, progress: ProgressFn<'_>) -> Result<PathBuf, InstallError> {
        tokio::fs::create_dir_all(&self.plugin_dir).await?;

        info!(url = %self.url, "Downloading cookie unlock plugin");
        progress(InstallProgress::Status(
            "Downloading cookie unlock plugin".to_string(),
        ));

        let archive = TempArchive::new(self.plugin_dir.join(TEMP_ZIP_NAME));
        download_to_file(&self.client, &self.url, archive.path(), progress).await?;

        progress(InstallProgress::Extracting);
        let archive_path = archive.path().to_path_buf();
        let dest = self.plugin_dir.clone();
        let written = tokio::task::spawn_blocking(move || {
            extract_zip_subtree(&archive_path, PLUGIN_PACKAGE, &dest)
        })
        .await
        .map_err(|e| InstallError::Extraction(e.to_string()))??;
        drop(archive);
        debug!(files = written, "Plugin archive extracted");

        verify(&self.marker_file())?;
        info!(path = %self.package_dir().display(), "Cookie unlock plugin installed");
        Ok(self.package_dir())
    }
}

fn verify(marker: &Path) -> Result<(), InstallError> {
    if marker.is_file() {
        Ok(())
    } else {
        Err(InstallError::Verification(format!(
            "{} missing after extraction",
            marker.display()
        )))
    }
}

#[async_trait]
impl InstallerPort for CookiePluginInstaller {
    fn name(&self) -> &'static str {
        "cookie-unlock-plugin"
    }

    async fn locate(&self) -> Option<PathBuf> {
        self.is_installed().then(|| self.package_dir())
    }

    async fn ensure(&self, progress: ProgressFn<'_>) -> Result<PathBuf, InstallError> {
        if self.is_installed() {
            debug!("Cookie unlock plugin already installed");
            return Ok(self.package_dir());
        }
        self.install(progress).await
    }
}

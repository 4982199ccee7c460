//! JSON file implementation of the settings repository.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use vidgrab_core::ports::{SettingsRepository, SettingsStoreError};
use vidgrab_core::settings::Settings;

/// Settings persisted as pretty-printed JSON.
///
/// A missing file yields defaults. An unreadable or corrupt file is logged
/// and also yields defaults; the next save overwrites it. A single bad value
/// only resets that setting.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, raw: &str) -> Settings {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Settings file is not valid JSON, using defaults");
                return Settings::with_defaults();
            }
        };
        match Settings::from_json_value(value) {
            Ok((settings, rejected)) => {
                for e in &rejected {
                    warn!(path = %self.path.display(), error = %e, "Ignoring invalid setting");
                }
                settings
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Settings file is not an object, using defaults");
                Settings::with_defaults()
            }
        }
    }
}

#[async_trait]
impl SettingsRepository for JsonSettingsStore {
    async fn load(&self) -> Result<Settings, SettingsStoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(self.parse(&raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No settings file, using defaults");
                Ok(Settings::with_defaults())
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read settings file, using defaults");
                Ok(Settings::with_defaults())
            }
        }
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsStoreError> {
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| SettingsStoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SettingsStoreError::Storage(e.to_string()))?;
        }

        // Written beside the target, then renamed over it.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| SettingsStoreError::Storage(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SettingsStoreError::Storage(e.to_string()))?;

        debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

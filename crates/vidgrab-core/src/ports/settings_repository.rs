//! Settings repository trait definition.
//!
//! This port defines the interface for application settings persistence.
//! Implementations handle all storage details internally.

use async_trait::async_trait;
use thiserror::Error;

use crate::settings::Settings;

/// Errors from the settings store.
#[derive(Debug, Error)]
pub enum SettingsStoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Repository for application settings persistence.
///
/// # Design Rules
///
/// - Works with domain `Settings` type directly
/// - A missing or unreadable store yields defaults; only writes fail
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Load application settings.
    ///
    /// Returns default settings if none are stored.
    async fn load(&self) -> Result<Settings, SettingsStoreError>;

    /// Save application settings.
    async fn save(&self, settings: &Settings) -> Result<(), SettingsStoreError>;
}

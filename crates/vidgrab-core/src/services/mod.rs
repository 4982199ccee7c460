//! Application services composed from ports.

mod settings_service;

pub use settings_service::{SettingsService, SettingsServiceError};

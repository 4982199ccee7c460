//! Settings service - orchestrates settings operations.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::benchmark::BenchmarkResult;
use crate::ports::{SettingsRepository, SettingsStoreError};
use crate::settings::{
    Settings, SettingsError, SettingsUpdate, validate_benchmark_fields, validate_settings,
};

/// Errors from settings operations.
#[derive(Debug, Error)]
pub enum SettingsServiceError {
    #[error(transparent)]
    Store(#[from] SettingsStoreError),

    #[error(transparent)]
    Invalid(#[from] SettingsError),
}

/// Service for settings operations.
#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    /// Create a new settings service.
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Get current settings.
    pub async fn get(&self) -> Result<Settings, SettingsServiceError> {
        Ok(self.repo.load().await?)
    }

    /// Update settings with partial changes.
    pub async fn update(&self, update: SettingsUpdate) -> Result<Settings, SettingsServiceError> {
        let mut current = self.repo.load().await?;
        current.merge(&update);
        validate_settings(&current)?;
        self.repo.save(&current).await?;
        Ok(current)
    }

    /// Save complete settings (validates first).
    pub async fn save(&self, settings: &Settings) -> Result<(), SettingsServiceError> {
        validate_settings(settings)?;
        Ok(self.repo.save(settings).await?)
    }

    /// Read one setting by key.
    pub async fn get_value(&self, key: &str) -> Result<Value, SettingsServiceError> {
        let settings = self.repo.load().await?;
        settings
            .get_value(key)
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()).into())
    }

    /// Set one setting by key, validate and persist.
    pub async fn set_value(&self, key: &str, value: Value) -> Result<Settings, SettingsServiceError> {
        let current = self.repo.load().await?;
        let updated = current.with_value(key, value)?;
        validate_settings(&updated)?;
        self.repo.save(&updated).await?;
        Ok(updated)
    }

    /// Persist a benchmark result, stamped with the current time.
    ///
    /// Only the benchmark fields are checked; problems elsewhere in the
    /// file are logged and left for the user to fix.
    pub async fn record_benchmark(
        &self,
        result: &BenchmarkResult,
    ) -> Result<Settings, SettingsServiceError> {
        let mut current = self.repo.load().await?;
        current.apply_benchmark(result, Utc::now());
        validate_benchmark_fields(&current)?;
        if let Err(e) = validate_settings(&current) {
            warn!(error = %e, "Saving benchmark alongside an invalid setting");
        }
        self.repo.save(&current).await?;
        Ok(current)
    }

    /// Drop any recorded benchmark result.
    pub async fn clear_benchmark(&self) -> Result<Settings, SettingsServiceError> {
        let mut current = self.repo.load().await?;
        current.clear_benchmark();
        self.repo.save(&current).await?;
        Ok(current)
    }

    /// Restore the compiled-in defaults.
    pub async fn reset(&self) -> Result<Settings, SettingsServiceError> {
        let defaults = Settings::with_defaults();
        self.repo.save(&defaults).await?;
        Ok(defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct MockSettingsRepo {
        settings: Mutex<Settings>,
        saves: Mutex<u32>,
    }

    impl MockSettingsRepo {
        fn new() -> Self {
            Self {
                settings: Mutex::new(Settings::with_defaults()),
                saves: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl SettingsRepository for MockSettingsRepo {
        async fn load(&self) -> Result<Settings, SettingsStoreError> {
            Ok(self.settings.lock().unwrap().clone())
        }

        async fn save(&self, settings: &Settings) -> Result<(), SettingsStoreError> {
            *self.settings.lock().unwrap() = settings.clone();
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_get_default_settings() {
        let service = SettingsService::new(Arc::new(MockSettingsRepo::new()));
        let settings = service.get().await.unwrap();
        assert!(settings.auto_concurrency);
    }

    #[tokio::test]
    async fn test_update_settings() {
        let service = SettingsService::new(Arc::new(MockSettingsRepo::new()));

        let update = SettingsUpdate {
            concurrent_fragments: Some(8),
            ..Default::default()
        };
        let updated = service.update(update).await.unwrap();
        assert_eq!(updated.concurrent_fragments, 8);

        // Verify persisted
        let fetched = service.get().await.unwrap();
        assert_eq!(fetched.concurrent_fragments, 8);
    }

    #[tokio::test]
    async fn test_invalid_set_is_not_saved() {
        let repo = Arc::new(MockSettingsRepo::new());
        let service = SettingsService::new(repo.clone());

        let err = service
            .set_value("concurrent_fragments", json!(0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsServiceError::Invalid(SettingsError::InvalidConcurrentFragments(0))
        ));
        assert_eq!(*repo.saves.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_then_get_value() {
        let service = SettingsService::new(Arc::new(MockSettingsRepo::new()));
        service
            .set_value("speed_limit_mbps", json!(12.5))
            .await
            .unwrap();
        assert_eq!(
            service.get_value("speed_limit_mbps").await.unwrap(),
            json!(12.5)
        );
        assert!(service.get_value("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_record_and_clear_benchmark() {
        let service = SettingsService::new(Arc::new(MockSettingsRepo::new()));
        let result = BenchmarkResult {
            optimal_workers: 2,
            best_workers: 4,
            min_size_per_worker_mb: 60,
            best_speed_mbps: 240.0,
            avg_speed_mb_per_sec: 30.0,
            results_a: Vec::new(),
            results_b: Vec::new(),
            combined: Vec::new(),
        };

        let saved = service.record_benchmark(&result).await.unwrap();
        assert!(saved.benchmark_completed);
        assert!(saved.benchmark_completed_at.is_some());

        let cleared = service.clear_benchmark().await.unwrap();
        assert_eq!(cleared.benchmark_optimal_workers, None);
    }

    #[tokio::test]
    async fn test_benchmark_saved_despite_unrelated_invalid_setting() {
        let repo = Arc::new(MockSettingsRepo::new());
        repo.settings.lock().unwrap().cookies_enabled = true;
        let service = SettingsService::new(repo.clone());
        let result = BenchmarkResult {
            optimal_workers: 4,
            best_workers: 4,
            min_size_per_worker_mb: 80,
            best_speed_mbps: 320.0,
            avg_speed_mb_per_sec: 40.0,
            results_a: Vec::new(),
            results_b: Vec::new(),
            combined: Vec::new(),
        };

        let saved = service.record_benchmark(&result).await.unwrap();
        assert_eq!(saved.benchmark_optimal_workers, Some(4));
        assert_eq!(*repo.saves.lock().unwrap(), 1);
        assert!(repo.settings.lock().unwrap().benchmark_completed);
    }

    #[tokio::test]
    async fn test_bad_benchmark_result_is_rejected() {
        let repo = Arc::new(MockSettingsRepo::new());
        let service = SettingsService::new(repo.clone());
        let result = BenchmarkResult {
            optimal_workers: 0,
            best_workers: 0,
            min_size_per_worker_mb: 80,
            best_speed_mbps: 0.0,
            avg_speed_mb_per_sec: 0.0,
            results_a: Vec::new(),
            results_b: Vec::new(),
            combined: Vec::new(),
        };

        let err = service.record_benchmark(&result).await.unwrap_err();
        assert!(matches!(
            err,
            SettingsServiceError::Invalid(SettingsError::InvalidOptimalWorkers)
        ));
        assert_eq!(*repo.saves.lock().unwrap(), 0);
    }
}

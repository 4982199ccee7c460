//! Settings domain types and validation.
//!
//! This module contains the persisted configuration used across the
//! application. These are pure domain types with no infrastructure
//! dependencies; the JSON file store lives in `vidgrab-runtime`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::benchmark::{BenchmarkResult, DEFAULT_PAYLOAD_A_URL, DEFAULT_PAYLOAD_B_URL, MIN_SIZE_FLOOR_MB};
use crate::concurrency::BenchmarkCalibration;
use crate::download::{OutputContainer, QualityTier};
use crate::ports::CookieSource;

/// Default manual fragment count when automatic concurrency is off.
pub const DEFAULT_CONCURRENT_FRAGMENTS: u32 = 4;

/// Upper bound for the manual fragment count.
pub const MAX_CONCURRENT_FRAGMENTS: u32 = 64;

/// Keys renamed in earlier releases, mapped to their current name.
const LEGACY_KEYS: [(&str, &str); 4] = [
    ("concurrent_fragment_downloads", "concurrent_fragments"),
    ("ratelimit_mbps", "speed_limit_mbps"),
    ("quality", "default_quality"),
    ("output_format", "default_format"),
];

/// Application settings structure.
///
/// Every field falls back to its compiled-in default when missing from the
/// persisted file. Unknown keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory downloads are written to.
    pub download_path: String,

    /// Explicit ffmpeg binary; empty means auto-detect.
    pub ffmpeg_path: String,

    /// Explicit yt-dlp binary; empty means search `PATH`.
    pub ytdlp_path: String,

    pub default_quality: QualityTier,
    pub default_format: OutputContainer,

    /// Keep the separate streams after merging.
    pub keep_original: bool,

    pub cookies_enabled: bool,
    /// Browser to read cookies from (e.g. `chrome`, `firefox`).
    pub cookies_browser: String,
    /// Cookie file used when no browser is set.
    pub cookies_file: String,

    /// Let the advisor pick the fragment count.
    pub auto_concurrency: bool,

    /// Manual fragment count (1-64), used when `auto_concurrency` is off.
    pub concurrent_fragments: u32,

    /// Rate ceiling in Mbps, 0 = unlimited.
    pub speed_limit_mbps: f64,

    /// HTTP chunk size in MB, 0 = provider default.
    pub chunk_size_mb: u32,

    /// Download buffer size in MB, 0 = provider default.
    pub buffer_size_mb: u32,

    pub benchmark_completed: bool,
    pub benchmark_optimal_workers: Option<u32>,
    pub benchmark_min_size_per_worker: Option<u32>,
    pub benchmark_completed_at: Option<DateTime<Utc>>,

    /// Reference payloads used by the network benchmark.
    pub benchmark_payload_a_url: String,
    pub benchmark_payload_b_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Settings {
    /// Every key accepted by [`Settings::get_value`] and [`Settings::with_value`].
    pub const KEYS: [&'static str; 20] = [
        "download_path",
        "ffmpeg_path",
        "ytdlp_path",
        "default_quality",
        "default_format",
        "keep_original",
        "cookies_enabled",
        "cookies_browser",
        "cookies_file",
        "auto_concurrency",
        "concurrent_fragments",
        "speed_limit_mbps",
        "chunk_size_mb",
        "buffer_size_mb",
        "benchmark_completed",
        "benchmark_optimal_workers",
        "benchmark_min_size_per_worker",
        "benchmark_completed_at",
        "benchmark_payload_a_url",
        "benchmark_payload_b_url",
    ];

    /// Create settings with the compiled-in defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            download_path: default_download_path().to_string_lossy().into_owned(),
            ffmpeg_path: String::new(),
            ytdlp_path: String::new(),
            default_quality: QualityTier::Best,
            default_format: OutputContainer::Mp4,
            keep_original: false,
            cookies_enabled: false,
            cookies_browser: String::new(),
            cookies_file: String::new(),
            auto_concurrency: true,
            concurrent_fragments: DEFAULT_CONCURRENT_FRAGMENTS,
            speed_limit_mbps: 0.0,
            chunk_size_mb: 0,
            buffer_size_mb: 0,
            benchmark_completed: false,
            benchmark_optimal_workers: None,
            benchmark_min_size_per_worker: None,
            benchmark_completed_at: None,
            benchmark_payload_a_url: DEFAULT_PAYLOAD_A_URL.to_string(),
            benchmark_payload_b_url: DEFAULT_PAYLOAD_B_URL.to_string(),
        }
    }

    /// Build settings from a persisted JSON document.
    ///
    /// Legacy keys are migrated first. Each known key is then applied on its
    /// own over the defaults, so one bad value only costs that setting. The
    /// rejected values are returned alongside the result.
    pub fn from_json_value(value: Value) -> Result<(Self, Vec<SettingsError>), SettingsError> {
        let Value::Object(mut map) = value else {
            return Err(SettingsError::InvalidValue {
                key: "settings".to_string(),
                reason: "expected a JSON object".to_string(),
            });
        };
        migrate_legacy_keys(&mut map);

        let mut settings = Self::with_defaults();
        let mut rejected = Vec::new();
        for key in Self::KEYS {
            let Some(raw) = map.remove(key) else {
                continue;
            };
            match settings.with_value(key, raw) {
                Ok(next) => settings = next,
                Err(e) => rejected.push(e),
            }
        }
        Ok((settings, rejected))
    }

    /// Calibration recorded by a completed benchmark, if usable.
    #[must_use]
    pub fn benchmark_calibration(&self) -> Option<BenchmarkCalibration> {
        if !self.benchmark_completed {
            return None;
        }
        let optimal = self.benchmark_optimal_workers.filter(|w| *w > 0)?;
        Some(BenchmarkCalibration {
            optimal_workers: optimal,
            min_size_per_worker_mb: self.benchmark_min_size_per_worker.filter(|m| *m > 0),
        })
    }

    /// Record a benchmark result.
    pub fn apply_benchmark(&mut self, result: &BenchmarkResult, now: DateTime<Utc>) {
        self.benchmark_completed = true;
        self.benchmark_optimal_workers = Some(result.optimal_workers);
        self.benchmark_min_size_per_worker = Some(result.min_size_per_worker_mb);
        self.benchmark_completed_at = Some(now);
    }

    /// Forget any recorded benchmark result.
    pub fn clear_benchmark(&mut self) {
        self.benchmark_completed = false;
        self.benchmark_optimal_workers = None;
        self.benchmark_min_size_per_worker = None;
        self.benchmark_completed_at = None;
    }

    /// Cookie source to hand to the provider, if cookies are enabled.
    ///
    /// A browser takes precedence over a cookie file.
    #[must_use]
    pub fn cookie_source(&self) -> Option<CookieSource> {
        if !self.cookies_enabled {
            return None;
        }
        let browser = self.cookies_browser.trim();
        if !browser.is_empty() {
            return Some(CookieSource::Browser(browser.to_string()));
        }
        let file = self.cookies_file.trim();
        (!file.is_empty()).then(|| CookieSource::File(PathBuf::from(file)))
    }

    /// Whether cookies are read straight from a browser profile.
    #[must_use]
    pub fn uses_browser_cookies(&self) -> bool {
        matches!(self.cookie_source(), Some(CookieSource::Browser(_)))
    }

    /// Explicit ffmpeg location, if configured.
    #[must_use]
    pub fn ffmpeg_override(&self) -> Option<PathBuf> {
        non_empty_path(&self.ffmpeg_path)
    }

    /// Explicit yt-dlp location, if configured.
    #[must_use]
    pub fn ytdlp_override(&self) -> Option<PathBuf> {
        non_empty_path(&self.ytdlp_path)
    }

    /// Read a single setting by key.
    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<Value> {
        if !Self::KEYS.contains(&key) {
            return None;
        }
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => map.remove(key),
            _ => None,
        }
    }

    /// Return a copy with one setting replaced.
    ///
    /// The result is not validated; callers run [`validate_settings`].
    pub fn with_value(&self, key: &str, value: Value) -> Result<Self, SettingsError> {
        if !Self::KEYS.contains(&key) {
            return Err(SettingsError::UnknownKey(key.to_string()));
        }
        let invalid = |reason: String| SettingsError::InvalidValue {
            key: key.to_string(),
            reason,
        };
        let Value::Object(mut map) = serde_json::to_value(self).map_err(|e| invalid(e.to_string()))?
        else {
            return Err(invalid("settings did not serialize to an object".to_string()));
        };
        map.insert(key.to_string(), value);
        serde_json::from_value(Value::Object(map)).map_err(|e| invalid(e.to_string()))
    }

    /// Merge a partial update into this one, only updating fields that are Some.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(ref path) = other.download_path {
            self.download_path.clone_from(path);
        }
        if let Some(ref path) = other.ffmpeg_path {
            self.ffmpeg_path.clone_from(path);
        }
        if let Some(ref path) = other.ytdlp_path {
            self.ytdlp_path.clone_from(path);
        }
        if let Some(quality) = other.default_quality {
            self.default_quality = quality;
        }
        if let Some(format) = other.default_format {
            self.default_format = format;
        }
        if let Some(keep) = other.keep_original {
            self.keep_original = keep;
        }
        if let Some(enabled) = other.cookies_enabled {
            self.cookies_enabled = enabled;
        }
        if let Some(ref browser) = other.cookies_browser {
            self.cookies_browser.clone_from(browser);
        }
        if let Some(ref file) = other.cookies_file {
            self.cookies_file.clone_from(file);
        }
        if let Some(auto) = other.auto_concurrency {
            self.auto_concurrency = auto;
        }
        if let Some(fragments) = other.concurrent_fragments {
            self.concurrent_fragments = fragments;
        }
        if let Some(limit) = other.speed_limit_mbps {
            self.speed_limit_mbps = limit;
        }
        if let Some(chunk) = other.chunk_size_mb {
            self.chunk_size_mb = chunk;
        }
        if let Some(buffer) = other.buffer_size_mb {
            self.buffer_size_mb = buffer;
        }
        if let Some(ref url) = other.benchmark_payload_a_url {
            self.benchmark_payload_a_url.clone_from(url);
        }
        if let Some(ref url) = other.benchmark_payload_b_url {
            self.benchmark_payload_b_url.clone_from(url);
        }
    }
}

fn non_empty_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

/// User Downloads directory, falling back to `~/Downloads`.
fn default_download_path() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}

/// Rename legacy keys in place. Returns `true` if anything changed.
///
/// When both the legacy and the current key exist, the current key wins and
/// the legacy one is dropped.
pub fn migrate_legacy_keys(map: &mut Map<String, Value>) -> bool {
    let mut changed = false;
    for (old, new) in LEGACY_KEYS {
        if let Some(value) = map.remove(old) {
            changed = true;
            if !map.contains_key(new) {
                map.insert(new.to_string(), value);
            }
        }
    }
    changed
}

/// Partial settings update.
///
/// `None` leaves the field unchanged. Benchmark results are written through
/// [`Settings::apply_benchmark`] instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub download_path: Option<String>,
    pub ffmpeg_path: Option<String>,
    pub ytdlp_path: Option<String>,
    pub default_quality: Option<QualityTier>,
    pub default_format: Option<OutputContainer>,
    pub keep_original: Option<bool>,
    pub cookies_enabled: Option<bool>,
    pub cookies_browser: Option<String>,
    pub cookies_file: Option<String>,
    pub auto_concurrency: Option<bool>,
    pub concurrent_fragments: Option<u32>,
    pub speed_limit_mbps: Option<f64>,
    pub chunk_size_mb: Option<u32>,
    pub buffer_size_mb: Option<u32>,
    pub benchmark_payload_a_url: Option<String>,
    pub benchmark_payload_b_url: Option<String>,
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("Download path cannot be empty")]
    EmptyDownloadPath,

    #[error("Concurrent fragments must be between 1 and 64, got {0}")]
    InvalidConcurrentFragments(u32),

    #[error("Speed limit must be a non-negative number, got {0}")]
    InvalidSpeedLimit(f64),

    #[error("Benchmark optimal worker count must be at least 1")]
    InvalidOptimalWorkers,

    #[error("Benchmark minimum size per worker must be at least 50 MB, got {0}")]
    InvalidMinSizePerWorker(u32),

    #[error("Cookies are enabled but neither a browser nor a cookie file is set")]
    MissingCookieSource,

    #[error("Benchmark payload URL cannot be empty")]
    EmptyPayloadUrl,

    #[error("Unknown setting '{0}'")]
    UnknownKey(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Validate only the recorded benchmark calibration.
pub fn validate_benchmark_fields(settings: &Settings) -> Result<(), SettingsError> {
    if settings.benchmark_optimal_workers == Some(0) {
        return Err(SettingsError::InvalidOptimalWorkers);
    }

    if let Some(min_size) = settings
        .benchmark_min_size_per_worker
        .filter(|m| *m < MIN_SIZE_FLOOR_MB)
    {
        return Err(SettingsError::InvalidMinSizePerWorker(min_size));
    }

    Ok(())
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings.download_path.trim().is_empty() {
        return Err(SettingsError::EmptyDownloadPath);
    }

    if !(1..=MAX_CONCURRENT_FRAGMENTS).contains(&settings.concurrent_fragments) {
        return Err(SettingsError::InvalidConcurrentFragments(
            settings.concurrent_fragments,
        ));
    }

    if !settings.speed_limit_mbps.is_finite() || settings.speed_limit_mbps < 0.0 {
        return Err(SettingsError::InvalidSpeedLimit(settings.speed_limit_mbps));
    }

    validate_benchmark_fields(settings)?;

    if settings.cookies_enabled && settings.cookie_source().is_none() {
        return Err(SettingsError::MissingCookieSource);
    }

    if settings.benchmark_payload_a_url.trim().is_empty()
        || settings.benchmark_payload_b_url.trim().is_empty()
    {
        return Err(SettingsError::EmptyPayloadUrl);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_result() -> BenchmarkResult {
        BenchmarkResult {
            optimal_workers: 3,
            best_workers: 4,
            min_size_per_worker_mb: 80,
            best_speed_mbps: 320.0,
            avg_speed_mb_per_sec: 40.0,
            results_a: Vec::new(),
            results_b: Vec::new(),
            combined: Vec::new(),
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::with_defaults();
        assert!(settings.auto_concurrency);
        assert_eq!(settings.concurrent_fragments, DEFAULT_CONCURRENT_FRAGMENTS);
        assert_eq!(settings.default_quality, QualityTier::Best);
        assert_eq!(settings.default_format, OutputContainer::Mp4);
        assert!(!settings.benchmark_completed);
        assert_eq!(settings.benchmark_payload_a_url, DEFAULT_PAYLOAD_A_URL);
        assert!(!settings.download_path.is_empty());
    }

    #[test]
    fn test_validate_settings_valid() {
        assert!(validate_settings(&Settings::with_defaults()).is_ok());
    }

    #[test]
    fn test_validate_empty_path() {
        let settings = Settings {
            download_path: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::EmptyDownloadPath)
        );
    }

    #[test]
    fn test_validate_fragment_range() {
        for bad in [0, 65] {
            let settings = Settings {
                concurrent_fragments: bad,
                ..Default::default()
            };
            assert_eq!(
                validate_settings(&settings),
                Err(SettingsError::InvalidConcurrentFragments(bad))
            );
        }
    }

    #[test]
    fn test_validate_speed_limit() {
        let settings = Settings {
            speed_limit_mbps: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidSpeedLimit(_))
        ));
    }

    #[test]
    fn test_validate_benchmark_fields() {
        let zero_workers = Settings {
            benchmark_optimal_workers: Some(0),
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&zero_workers),
            Err(SettingsError::InvalidOptimalWorkers)
        );

        let tiny_min = Settings {
            benchmark_min_size_per_worker: Some(10),
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&tiny_min),
            Err(SettingsError::InvalidMinSizePerWorker(10))
        );
    }

    #[test]
    fn test_validate_cookie_source_required() {
        let settings = Settings {
            cookies_enabled: true,
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::MissingCookieSource)
        );
    }

    #[test]
    fn test_cookie_source_prefers_browser() {
        let settings = Settings {
            cookies_enabled: true,
            cookies_browser: "firefox".to_string(),
            cookies_file: "/tmp/cookies.txt".to_string(),
            ..Default::default()
        };
        assert_eq!(
            settings.cookie_source(),
            Some(CookieSource::Browser("firefox".to_string()))
        );
        assert!(settings.uses_browser_cookies());

        let disabled = Settings {
            cookies_enabled: false,
            ..settings
        };
        assert_eq!(disabled.cookie_source(), None);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let (settings, rejected) =
            Settings::from_json_value(json!({ "keep_original": true })).unwrap();
        assert!(rejected.is_empty());
        assert!(settings.keep_original);
        assert!(settings.auto_concurrency);
        assert_eq!(settings.concurrent_fragments, DEFAULT_CONCURRENT_FRAGMENTS);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let (settings, rejected) =
            Settings::from_json_value(json!({ "theme": "dark", "concurrent_fragments": 7 }))
                .unwrap();
        assert!(rejected.is_empty());
        assert_eq!(settings.concurrent_fragments, 7);
        let out = serde_json::to_value(&settings).unwrap();
        assert!(out.get("theme").is_none());
    }

    #[test]
    fn test_legacy_keys_migrated() {
        let (settings, _) = Settings::from_json_value(json!({
            "concurrent_fragment_downloads": 12,
            "ratelimit_mbps": 25.5,
            "quality": "720p",
            "output_format": "mkv"
        }))
        .unwrap();
        assert_eq!(settings.concurrent_fragments, 12);
        assert!((settings.speed_limit_mbps - 25.5).abs() < f64::EPSILON);
        assert_eq!(settings.default_quality, QualityTier::P720);
        assert_eq!(settings.default_format, OutputContainer::Mkv);
    }

    #[test]
    fn test_bad_value_only_drops_its_own_key() {
        let (settings, rejected) = Settings::from_json_value(json!({
            "download_path": "/data/videos",
            "default_format": "webm",
            "concurrent_fragments": "many",
            "benchmark_completed": true,
            "benchmark_optimal_workers": 3,
            "benchmark_min_size_per_worker": 80
        }))
        .unwrap();

        assert_eq!(settings.download_path, "/data/videos");
        assert_eq!(settings.default_format, OutputContainer::Mp4);
        assert_eq!(settings.concurrent_fragments, DEFAULT_CONCURRENT_FRAGMENTS);
        assert_eq!(
            settings.benchmark_calibration(),
            Some(BenchmarkCalibration {
                optimal_workers: 3,
                min_size_per_worker_mb: Some(80),
            })
        );
        let keys: Vec<_> = rejected
            .iter()
            .filter_map(|e| match e {
                SettingsError::InvalidValue { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(keys, ["default_format", "concurrent_fragments"]);
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        assert!(Settings::from_json_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_current_key_beats_legacy_key() {
        let mut map = json!({ "quality": "360p", "default_quality": "1080p" })
            .as_object()
            .cloned()
            .unwrap();
        assert!(migrate_legacy_keys(&mut map));
        assert_eq!(map.get("default_quality"), Some(&json!("1080p")));
        assert!(!map.contains_key("quality"));
    }

    #[test]
    fn test_get_and_set_value() {
        let settings = Settings::with_defaults();
        assert_eq!(settings.get_value("auto_concurrency"), Some(json!(true)));
        assert_eq!(settings.get_value("nope"), None);

        let changed = settings
            .with_value("concurrent_fragments", json!(16))
            .unwrap();
        assert_eq!(changed.concurrent_fragments, 16);

        let quality = settings.with_value("default_quality", json!("480p")).unwrap();
        assert_eq!(quality.default_quality, QualityTier::P480);
    }

    #[test]
    fn test_set_value_errors() {
        let settings = Settings::with_defaults();
        assert_eq!(
            settings.with_value("bogus", json!(1)),
            Err(SettingsError::UnknownKey("bogus".to_string()))
        );
        assert!(matches!(
            settings.with_value("concurrent_fragments", json!("many")),
            Err(SettingsError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_every_key_is_readable() {
        let settings = Settings::with_defaults();
        for key in Settings::KEYS {
            assert!(settings.get_value(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn test_apply_and_clear_benchmark() {
        let mut settings = Settings::with_defaults();
        let now = Utc::now();
        settings.apply_benchmark(&sample_result(), now);

        assert!(settings.benchmark_completed);
        assert_eq!(settings.benchmark_optimal_workers, Some(3));
        assert_eq!(settings.benchmark_min_size_per_worker, Some(80));
        assert_eq!(settings.benchmark_completed_at, Some(now));
        assert_eq!(
            settings.benchmark_calibration(),
            Some(BenchmarkCalibration {
                optimal_workers: 3,
                min_size_per_worker_mb: Some(80),
            })
        );

        settings.clear_benchmark();
        assert!(!settings.benchmark_completed);
        assert_eq!(settings.benchmark_calibration(), None);
    }

    #[test]
    fn test_calibration_requires_completed_flag() {
        let settings = Settings {
            benchmark_completed: false,
            benchmark_optimal_workers: Some(3),
            ..Default::default()
        };
        assert_eq!(settings.benchmark_calibration(), None);
    }

    #[test]
    fn test_merge_settings() {
        let mut settings = Settings::with_defaults();
        let update = SettingsUpdate {
            concurrent_fragments: Some(9),
            default_quality: Some(QualityTier::P1080),
            ..Default::default()
        };
        settings.merge(&update);

        assert_eq!(settings.concurrent_fragments, 9);
        assert_eq!(settings.default_quality, QualityTier::P1080);
        assert!(settings.auto_concurrency); // Unchanged
    }
}

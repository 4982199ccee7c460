//! Quality tiers, output containers and format-selector construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Requested video quality.
///
/// `Best` leaves the choice to the provider; the numeric tiers cap the
/// vertical resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QualityTier {
    #[default]
    #[serde(rename = "Best")]
    Best,
    #[serde(rename = "2160p")]
    P2160,
    #[serde(rename = "1440p")]
    P1440,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
}

impl QualityTier {
    /// All tiers, best first.
    pub const ALL: [Self; 7] = [
        Self::Best,
        Self::P2160,
        Self::P1440,
        Self::P1080,
        Self::P720,
        Self::P480,
        Self::P360,
    ];

    /// Maximum vertical resolution, or `None` for `Best`.
    #[must_use]
    pub const fn max_height(self) -> Option<u32> {
        match self {
            Self::Best => None,
            Self::P2160 => Some(2160),
            Self::P1440 => Some(1440),
            Self::P1080 => Some(1080),
            Self::P720 => Some(720),
            Self::P480 => Some(480),
            Self::P360 => Some(360),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Best => "Best",
            Self::P2160 => "2160p",
            Self::P1440 => "1440p",
            Self::P1080 => "1080p",
            Self::P720 => "720p",
            Self::P480 => "480p",
            Self::P360 => "360p",
        }
    }

    /// Build the provider's format-selector expression for this tier.
    ///
    /// Capped tiers end with a bare `best` alternative so the provider still
    /// picks something when nothing satisfies the height constraint.
    #[must_use]
    pub fn format_selector(self) -> String {
        match self.max_height() {
            None => "bestvideo+bestaudio/best".to_string(),
            Some(h) => format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]/best"),
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("best") {
            return Ok(Self::Best);
        }
        let digits = trimmed.trim_end_matches(['p', 'P']);
        Self::ALL
            .into_iter()
            .find(|tier| tier.max_height().is_some_and(|h| h.to_string() == digits))
            .ok_or_else(|| format!("unknown quality '{s}' (expected Best, 2160p, 1440p, 1080p, 720p, 480p or 360p)"))
    }
}

/// Container the provider merges the streams into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputContainer {
    #[default]
    Mp4,
    Mkv,
    Ts,
}

impl OutputContainer {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mkv => "mkv",
            Self::Ts => "ts",
        }
    }
}

impl fmt::Display for OutputContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputContainer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "mkv" => Ok(Self::Mkv),
            "ts" => Ok(Self::Ts),
            other => Err(format!("unknown container '{other}' (expected mp4, mkv or ts)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_selector_is_unconstrained() {
        assert_eq!(QualityTier::Best.format_selector(), "bestvideo+bestaudio/best");
    }

    #[test]
    fn test_capped_selector_has_fallback() {
        assert_eq!(
            QualityTier::P1080.format_selector(),
            "bestvideo[height<=1080]+bestaudio/best[height<=1080]/best"
        );
    }

    #[test]
    fn test_quality_parse() {
        assert_eq!("best".parse::<QualityTier>().unwrap(), QualityTier::Best);
        assert_eq!("720p".parse::<QualityTier>().unwrap(), QualityTier::P720);
        assert_eq!("1440".parse::<QualityTier>().unwrap(), QualityTier::P1440);
        assert!("999p".parse::<QualityTier>().is_err());
    }

    #[test]
    fn test_quality_serde_uses_labels() {
        let json = serde_json::to_string(&QualityTier::P2160).unwrap();
        assert_eq!(json, "\"2160p\"");
        let back: QualityTier = serde_json::from_str("\"Best\"").unwrap();
        assert_eq!(back, QualityTier::Best);
    }

    #[test]
    fn test_container_parse() {
        assert_eq!("MKV".parse::<OutputContainer>().unwrap(), OutputContainer::Mkv);
        assert!("avi".parse::<OutputContainer>().is_err());
    }
}

//! Parsing of yt-dlp output.
//!
//! Progress arrives on stdout, one line per update, because the bridge passes
//! `--newline` and a progress template that prefixes a JSON dump of the
//! progress dict with [`PROGRESS_MARKER`]:
//!
//! ```text
//! [vidgrab-progress] {"status": "downloading", "downloaded_bytes": 1024, "total_bytes": 4096, ...}
//! [vidgrab-progress] {"status": "finished", "filename": "clip.f137.mp4", ...}
//! ```
//!
//! Metadata comes from `--dump-single-json` as one JSON document.

use serde::Deserialize;
use thiserror::Error;
use vidgrab_core::ports::{FormatInfo, MediaMetadata, ProgressTick, ProviderEvent};

/// Prefix identifying progress lines on stdout.
pub const PROGRESS_MARKER: &str = "[vidgrab-progress] ";

/// Errors that can occur when parsing provider output.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),
}

/// Raw progress dict as dumped by the template.
#[derive(Debug, Deserialize)]
struct RawProgress {
    status: String,
    downloaded_bytes: Option<f64>,
    total_bytes: Option<f64>,
    total_bytes_estimate: Option<f64>,
    filename: Option<String>,
    #[serde(rename = "_percent_str")]
    percent_str: Option<String>,
    #[serde(rename = "_speed_str")]
    speed_str: Option<String>,
    #[serde(rename = "_eta_str")]
    eta_str: Option<String>,
}

/// One parsed progress line, before byte accumulation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressLine {
    Downloading {
        filename: Option<String>,
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
        percent: f64,
        speed: String,
        eta: String,
    },
    Finished {
        filename: Option<String>,
        total_bytes: Option<u64>,
    },
    /// yt-dlp reported a download error for the current file.
    Error,
}

/// Remove ANSI escape sequences (yt-dlp colours its `_str` fields).
pub fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            if chars.peek() == Some(&'[') {
                chars.next();
                // CSI: parameters and intermediates, then one final byte.
                for next in chars.by_ref() {
                    if ('@'..='~').contains(&next) {
                        break;
                    }
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

fn clean(field: Option<String>) -> String {
    field
        .map(|s| strip_ansi(&s).trim().to_string())
        .filter(|s| !s.is_empty() && s != "NA" && s != "N/A")
        .unwrap_or_default()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_bytes(value: Option<f64>) -> Option<u64> {
    value.filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u64)
}

fn parse_percent(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('%').trim().parse::<f64>().ok()
}

/// Parse a stdout line. Returns `Ok(None)` for lines without the marker.
#[allow(clippy::cast_precision_loss)]
pub fn parse_progress_line(line: &str) -> Result<Option<ProgressLine>, ProtocolError> {
    let Some(payload) = line.trim_end().strip_prefix(PROGRESS_MARKER) else {
        return Ok(None);
    };
    let raw: RawProgress = serde_json::from_str(payload)?;

    let total_bytes = to_bytes(raw.total_bytes).or_else(|| to_bytes(raw.total_bytes_estimate));

    match raw.status.as_str() {
        "downloading" => {
            let downloaded_bytes = to_bytes(raw.downloaded_bytes).unwrap_or(0);
            let percent_str = clean(raw.percent_str);
            let percent = match total_bytes.filter(|t| *t > 0) {
                Some(total) => downloaded_bytes as f64 / total as f64 * 100.0,
                None => parse_percent(&percent_str).unwrap_or(0.0),
            }
            .clamp(0.0, 100.0);

            Ok(Some(ProgressLine::Downloading {
                filename: raw.filename,
                downloaded_bytes,
                total_bytes,
                percent,
                speed: clean(raw.speed_str),
                eta: clean(raw.eta_str),
            }))
        }
        "finished" => Ok(Some(ProgressLine::Finished {
            filename: raw.filename,
            total_bytes: total_bytes.or_else(|| to_bytes(raw.downloaded_bytes)),
        })),
        "error" => Ok(Some(ProgressLine::Error)),
        other => Err(ProtocolError::UnknownStatus(other.to_string())),
    }
}

/// Sums downloaded bytes across the files of one job.
///
/// yt-dlp restarts `downloaded_bytes` at zero for every file (video, audio,
/// subtitles); the accumulator keeps a running total.
#[derive(Debug, Default)]
pub struct ByteAccumulator {
    completed: u64,
    current_file: Option<String>,
    current: u64,
}

impl ByteAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn total(&self) -> u64 {
        self.completed + self.current
    }

    fn switch_to(&mut self, filename: Option<&String>) {
        if filename.is_some() && filename != self.current_file.as_ref() {
            self.completed += self.current;
            self.current = 0;
            self.current_file = filename.cloned();
        }
    }

    /// Fold a parsed line into the running total and convert it to an event.
    pub fn apply(&mut self, line: ProgressLine) -> Option<ProviderEvent> {
        match line {
            ProgressLine::Downloading {
                filename,
                downloaded_bytes,
                total_bytes,
                percent,
                speed,
                eta,
            } => {
                self.switch_to(filename.as_ref());
                self.current = self.current.max(downloaded_bytes);
                Some(ProviderEvent::Downloading(ProgressTick {
                    downloaded_bytes: self.total(),
                    total_bytes,
                    percent,
                    speed,
                    eta,
                }))
            }
            ProgressLine::Finished {
                filename,
                total_bytes,
            } => {
                self.switch_to(filename.as_ref());
                if let Some(total) = total_bytes {
                    self.current = self.current.max(total);
                }
                Some(ProviderEvent::Finished { filename })
            }
            ProgressLine::Error => None,
        }
    }
}

// ============================================================================
// Metadata
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: Option<String>,
    ext: Option<String>,
    height: Option<f64>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
    vcodec: Option<String>,
    acodec: Option<String>,
}

impl RawFormat {
    fn size(&self) -> Option<u64> {
        to_bytes(self.filesize).or_else(|| to_bytes(self.filesize_approx))
    }
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    title: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
    #[serde(default)]
    requested_formats: Vec<RawFormat>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

/// Parse the `--dump-single-json` document.
///
/// Size resolution: exact `filesize`, then `filesize_approx`, then the sum of
/// the requested formats (video + audio) when every one of them has a size.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_metadata(json: &str) -> Result<MediaMetadata, ProtocolError> {
    let raw: RawMetadata = serde_json::from_str(json)?;

    let requested_sum = if raw.requested_formats.is_empty() {
        None
    } else {
        raw.requested_formats
            .iter()
            .map(RawFormat::size)
            .sum::<Option<u64>>()
    };
    let size_bytes = to_bytes(raw.filesize)
        .or_else(|| to_bytes(raw.filesize_approx))
        .or(requested_sum);

    let formats = raw
        .formats
        .into_iter()
        .map(|f| FormatInfo {
            filesize: f.size(),
            format_id: f.format_id.unwrap_or_default(),
            ext: f.ext,
            height: f.height.filter(|h| h.is_finite() && *h > 0.0).map(|h| h as u32),
            vcodec: f.vcodec,
            acodec: f.acodec,
        })
        .collect();

    Ok(MediaMetadata {
        title: raw.title,
        duration_secs: raw.duration,
        uploader: raw.uploader,
        size_bytes,
        formats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(json: &str) -> String {
        format!("{PROGRESS_MARKER}{json}")
    }

    #[test]
    fn test_non_marker_lines_ignored() {
        assert!(parse_progress_line("[youtube] abc: Downloading webpage").unwrap().is_none());
        assert!(parse_progress_line("").unwrap().is_none());
    }

    #[test]
    fn test_parse_downloading() {
        let parsed = parse_progress_line(&line(
            r#"{"status":"downloading","downloaded_bytes":250,"total_bytes":1000,"filename":"a.mp4","_percent_str":" 25.0%","_speed_str":"1.00MiB/s","_eta_str":"00:03"}"#,
        ))
        .unwrap()
        .unwrap();

        assert_eq!(
            parsed,
            ProgressLine::Downloading {
                filename: Some("a.mp4".to_string()),
                downloaded_bytes: 250,
                total_bytes: Some(1000),
                percent: 25.0,
                speed: "1.00MiB/s".to_string(),
                eta: "00:03".to_string(),
            }
        );
    }

    #[test]
    fn test_percent_falls_back_to_string() {
        let parsed = parse_progress_line(&line(
            r#"{"status":"downloading","downloaded_bytes":10,"_percent_str":"\u001b[0;94m 42.5%\u001b[0m","_speed_str":null,"_eta_str":"NA"}"#,
        ))
        .unwrap()
        .unwrap();

        let ProgressLine::Downloading {
            percent, speed, eta, ..
        } = parsed
        else {
            panic!("expected downloading line");
        };
        assert!((percent - 42.5).abs() < f64::EPSILON);
        assert!(speed.is_empty());
        assert!(eta.is_empty());
    }

    #[test]
    fn test_estimate_used_when_total_missing() {
        let parsed = parse_progress_line(&line(
            r#"{"status":"downloading","downloaded_bytes":50,"total_bytes_estimate":200.0}"#,
        ))
        .unwrap()
        .unwrap();
        assert!(matches!(
            parsed,
            ProgressLine::Downloading { total_bytes: Some(200), .. }
        ));
    }

    #[test]
    fn test_unknown_status_is_error() {
        assert!(matches!(
            parse_progress_line(&line(r#"{"status":"paused"}"#)),
            Err(ProtocolError::UnknownStatus(_))
        ));
        assert!(matches!(
            parse_progress_line(&line("{broken")),
            Err(ProtocolError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\u{1b}[0;32m 12.3%\u{1b}[0m"), " 12.3%");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn test_accumulator_sums_files() {
        let mut acc = ByteAccumulator::new();
        let tick = |file: &str, bytes: u64| ProgressLine::Downloading {
            filename: Some(file.to_string()),
            downloaded_bytes: bytes,
            total_bytes: None,
            percent: 0.0,
            speed: String::new(),
            eta: String::new(),
        };

        acc.apply(tick("video.mp4", 100));
        acc.apply(tick("video.mp4", 300));
        acc.apply(ProgressLine::Finished {
            filename: Some("video.mp4".to_string()),
            total_bytes: Some(400),
        });
        assert_eq!(acc.total(), 400);

        let event = acc.apply(tick("audio.m4a", 50)).unwrap();
        let ProviderEvent::Downloading(progress) = event else {
            panic!("expected progress");
        };
        assert_eq!(progress.downloaded_bytes, 450);
    }

    #[test]
    fn test_metadata_exact_size() {
        let meta = parse_metadata(
            r#"{"title":"Clip","duration":12.5,"uploader":"someone","filesize":1048576,"formats":[{"format_id":"137","ext":"mp4","height":1080,"filesize":900}]}"#,
        )
        .unwrap();
        assert_eq!(meta.title.as_deref(), Some("Clip"));
        assert_eq!(meta.size_bytes, Some(1_048_576));
        assert_eq!(meta.formats.len(), 1);
        assert_eq!(meta.formats[0].height, Some(1080));
    }

    #[test]
    fn test_metadata_size_fallbacks() {
        let approx = parse_metadata(r#"{"filesize_approx":5000}"#).unwrap();
        assert_eq!(approx.size_bytes, Some(5000));

        let summed = parse_metadata(
            r#"{"requested_formats":[{"filesize":3000},{"filesize_approx":1000}]}"#,
        )
        .unwrap();
        assert_eq!(summed.size_bytes, Some(4000));

        let partial = parse_metadata(r#"{"requested_formats":[{"filesize":3000},{}]}"#).unwrap();
        assert_eq!(partial.size_bytes, None);

        let unknown = parse_metadata(r#"{"title":"x"}"#).unwrap();
        assert_eq!(unknown.size_bytes, None);
    }
}

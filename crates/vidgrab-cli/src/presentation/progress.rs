//! Terminal progress rendering for downloads, benchmarks and tool installs.
//!
//! Presentation only: renderers consume the events the services emit and
//! never touch the operation itself. On a terminal they draw `indicatif`
//! bars; otherwise they print throttled plain lines.

use std::io::{self, IsTerminal, Write};
use std::time::{Duration, Instant};

use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};
use vidgrab_core::{BenchmarkEvent, DownloadEvent, InstallProgress};

use super::summary::run_line;

/// Bar resolution; percentages are drawn in tenths.
const PERCENT_SCALE: u64 = 1000;

/// Minimum gap between plain progress lines.
const PLAIN_MIN_INTERVAL: Duration = Duration::from_millis(250);

const TICK_INTERVAL: Duration = Duration::from_millis(120);

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn per_mille(percent: f64) -> u64 {
    if percent.is_nan() {
        return 0;
    }
    (percent.clamp(0.0, 100.0) * 10.0).round() as u64
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stdout());
    bar.set_style(style("{spinner} {msg}"));
    bar.set_message(message.to_string());
    bar.enable_steady_tick(TICK_INTERVAL);
    bar
}

// ============================================================================
// Downloads
// ============================================================================

/// Renders one download's event stream.
pub struct DownloadProgress {
    inner: DownloadRender,
}

enum DownloadRender {
    Fancy(FancyDownload),
    Plain(PlainDownload<io::Stdout>),
}

impl DownloadProgress {
    /// Create a renderer, auto-detecting terminal capability.
    pub fn new() -> Self {
        let inner = if io::stdout().is_terminal() {
            DownloadRender::Fancy(FancyDownload::new())
        } else {
            DownloadRender::Plain(PlainDownload::new(io::stdout()))
        };
        Self { inner }
    }

    pub fn handle(&mut self, event: &DownloadEvent) {
        match &mut self.inner {
            DownloadRender::Fancy(inner) => inner.handle(event),
            DownloadRender::Plain(inner) => inner.handle(event),
        }
    }

    /// Finish and clear the progress display.
    pub fn finish(&mut self) {
        if let DownloadRender::Fancy(inner) = &self.inner {
            inner.bar.finish_and_clear();
        }
    }
}

impl Default for DownloadProgress {
    fn default() -> Self {
        Self::new()
    }
}

struct FancyDownload {
    bar: ProgressBar,
    transferring: bool,
}

impl FancyDownload {
    fn new() -> Self {
        Self {
            bar: spinner("Preparing download"),
            transferring: false,
        }
    }

    fn handle(&mut self, event: &DownloadEvent) {
        match event {
            DownloadEvent::Progress { percent, .. } => {
                if !self.transferring {
                    self.bar.set_style(style("{spinner} [{bar:30.cyan/blue}] {msg}"));
                    self.bar.set_length(PERCENT_SCALE);
                    self.transferring = true;
                }
                self.bar.set_position(per_mille(*percent));
            }
            // Status lines carry percent, speed and ETA during the transfer
            DownloadEvent::Status { message } => self.bar.set_message(message.clone()),
            DownloadEvent::StateChanged { .. } => {}
            DownloadEvent::Completed { .. }
            | DownloadEvent::Failed { .. }
            | DownloadEvent::Cancelled => self.bar.finish_and_clear(),
        }
    }
}

/// Line-per-update output for pipes and log files.
///
/// Every status line is printed, except that the ones following a progress
/// tick are throttled (the final 100% tick always gets through).
struct PlainDownload<W: Write> {
    out: W,
    last_tick_line: Option<Instant>,
    pending_tick: Option<f64>,
}

impl<W: Write> PlainDownload<W> {
    const fn new(out: W) -> Self {
        Self {
            out,
            last_tick_line: None,
            pending_tick: None,
        }
    }

    fn handle(&mut self, event: &DownloadEvent) {
        match event {
            DownloadEvent::Progress { percent, .. } => self.pending_tick = Some(*percent),
            DownloadEvent::Status { message } => {
                if let Some(percent) = self.pending_tick.take() {
                    let recent = self
                        .last_tick_line
                        .is_some_and(|at| at.elapsed() < PLAIN_MIN_INTERVAL);
                    if recent && percent < 100.0 {
                        return;
                    }
                    self.last_tick_line = Some(Instant::now());
                }
                let _ = writeln!(self.out, "{message}");
                self.out.flush().ok();
            }
            _ => {}
        }
    }
}

// ============================================================================
// Benchmark
// ============================================================================

/// Renders benchmark events: overall percentage plus one line per run.
pub struct BenchmarkProgress {
    bar: ProgressBar,
}

impl BenchmarkProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(PERCENT_SCALE), ProgressDrawTarget::stdout());
        bar.set_style(style("{spinner} [{bar:30.green/white}] {percent:>3}% {msg}"));
        bar.enable_steady_tick(TICK_INTERVAL);
        Self { bar }
    }

    pub fn handle(&self, event: &BenchmarkEvent) {
        match event {
            BenchmarkEvent::Progress { percent } => self.bar.set_position(per_mille(*percent)),
            BenchmarkEvent::Status(message) => self.bar.set_message(message.clone()),
            BenchmarkEvent::RunFinished(record) => self.bar.println(run_line(record)),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for BenchmarkProgress {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tool installs
// ============================================================================

/// Spinner that turns into a byte bar once the archive size is known.
pub struct InstallProgressBar {
    bar: ProgressBar,
    label: String,
}

impl InstallProgressBar {
    pub fn new(label: &str) -> Self {
        Self {
            bar: spinner(&format!("Checking {label}")),
            label: label.to_string(),
        }
    }

    pub fn update(&self, progress: InstallProgress) {
        match progress {
            InstallProgress::Downloading { downloaded, total } if total > 0 => {
                if self.bar.length() != Some(total) {
                    self.bar.set_style(style(
                        "{spinner} {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
                    ));
                    self.bar.set_length(total);
                    self.bar.set_message(format!("Downloading {}", self.label));
                }
                self.bar.set_position(downloaded);
            }
            InstallProgress::Downloading { downloaded, .. } => self
                .bar
                .set_message(format!("Downloading {} ({})", self.label, HumanBytes(downloaded))),
            InstallProgress::Extracting => {
                self.bar.set_style(style("{spinner} {msg}"));
                self.bar.set_message(format!("Extracting {}", self.label));
            }
            InstallProgress::Status(message) => self.bar.set_message(message),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(out: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(out).lines().map(str::to_string).collect()
    }

    fn tick(percent: f64) -> [DownloadEvent; 2] {
        [
            DownloadEvent::Progress {
                percent,
                speed: "2.00MiB/s".to_string(),
                eta: "00:05".to_string(),
            },
            DownloadEvent::status(format!("Downloading: {percent:.1}%")),
        ]
    }

    #[test]
    fn test_per_mille() {
        assert_eq!(per_mille(0.0), 0);
        assert_eq!(per_mille(42.37), 424);
        assert_eq!(per_mille(100.0), 1000);
        assert_eq!(per_mille(250.0), 1000);
        assert_eq!(per_mille(-1.0), 0);
        assert_eq!(per_mille(f64::NAN), 0);
    }

    #[test]
    fn test_plain_throttles_ticks_but_not_statuses() {
        let mut plain = PlainDownload::new(Vec::new());
        plain.handle(&DownloadEvent::status("Resolving video information..."));
        for event in tick(10.0).iter().chain(tick(11.0).iter()) {
            plain.handle(event);
        }
        plain.handle(&DownloadEvent::status("Starting merge"));
        for event in &tick(100.0) {
            plain.handle(event);
        }

        assert_eq!(
            lines(&plain.out),
            vec![
                "Resolving video information...",
                "Downloading: 10.0%",
                "Starting merge",
                "Downloading: 100.0%",
            ]
        );
    }

    #[test]
    fn test_plain_ignores_lifecycle_events() {
        let mut plain = PlainDownload::new(Vec::new());
        plain.handle(&DownloadEvent::Cancelled);
        plain.handle(&DownloadEvent::state(vidgrab_core::JobState::Downloading));
        assert!(plain.out.is_empty());
    }

    #[test]
    fn test_install_bar_accepts_every_variant() {
        let bar = InstallProgressBar {
            bar: ProgressBar::hidden(),
            label: "ffmpeg".to_string(),
        };
        bar.update(InstallProgress::Downloading { downloaded: 10, total: 0 });
        bar.update(InstallProgress::Downloading { downloaded: 10, total: 100 });
        assert_eq!(bar.bar.length(), Some(100));
        assert_eq!(bar.bar.position(), 10);
        bar.update(InstallProgress::Extracting);
        bar.update(InstallProgress::Status("done".to_string()));
        bar.finish();
    }
}

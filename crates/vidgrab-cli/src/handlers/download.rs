//! Download command handler.
//!
//! Runs one download through the orchestrator. Events flow over a channel
//! to a render task; Ctrl-C cancels the job through its token.

use anyhow::Result;
use indicatif::HumanBytes;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vidgrab_core::{
    ChannelEmitter, CompletedDownload, DownloadEvent, DownloadRequest, OutputContainer,
    QualityTier,
};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::DownloadProgress;

/// Arguments for the download command.
#[derive(Debug, Clone, Default)]
pub struct DownloadArgs {
    pub url: String,
    pub quality: Option<QualityTier>,
    pub format: Option<OutputContainer>,
    pub workers: Option<u32>,
    pub limit_mbps: Option<f64>,
}

impl DownloadArgs {
    /// Turn the flags into a request; unset flags fall back to settings.
    pub fn into_request(self) -> Result<DownloadRequest, CliError> {
        let mut request = DownloadRequest::new(self.url);
        request.quality = self.quality;
        request.container = self.format;
        request.workers = self.workers;
        if let Some(mbps) = self.limit_mbps {
            if !mbps.is_finite() || mbps < 0.0 {
                return Err(CliError::Arguments(
                    "--limit-mbps must be a non-negative number".to_string(),
                ));
            }
            request = request.with_speed_limit_mbps(mbps);
        }
        Ok(request)
    }
}

/// Cancel `cancel` on the first Ctrl-C.
pub fn cancel_on_ctrl_c(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Ctrl-C received, cancelling");
            cancel.cancel();
        }
    })
}

fn print_completed(done: &CompletedDownload) {
    let title = done.title.as_deref().unwrap_or(&done.url);
    println!("✓ Downloaded: {title}");
    println!(
        "  Saved to {} ({} with {} parallel fragments)",
        done.output_dir.display(),
        HumanBytes(done.bytes_transferred),
        done.concurrency
    );
}

/// Execute the download command.
pub async fn execute(ctx: &CliContext, args: DownloadArgs) -> Result<()> {
    let request = args.into_request()?;
    let settings = ctx.settings().get().await.map_err(CliError::from)?;
    let orchestrator = ctx.orchestrator(&settings)?;

    let (emitter, mut events) = ChannelEmitter::<DownloadEvent>::channel();
    let cancel = CancellationToken::new();
    let signal = cancel_on_ctrl_c(cancel.clone());

    let render = tokio::spawn(async move {
        let mut progress = DownloadProgress::new();
        while let Some(event) = events.recv().await {
            progress.handle(&event);
        }
        progress.finish();
    });

    let result = orchestrator
        .download(request, &settings, &emitter, cancel)
        .await;

    // Closing the channel ends the render loop
    drop(emitter);
    signal.abort();
    if let Err(e) = render.await {
        debug!(error = %e, "Progress renderer stopped abnormally");
    }

    let done = result.map_err(CliError::from)?;
    print_completed(&done);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_keeps_unset_overrides_empty() {
        let request = DownloadArgs {
            url: "https://example.com/v".to_string(),
            ..Default::default()
        }
        .into_request()
        .unwrap();
        assert_eq!(request, DownloadRequest::new("https://example.com/v"));
    }

    #[test]
    fn test_request_carries_overrides() {
        let request = DownloadArgs {
            url: "u".to_string(),
            quality: Some(QualityTier::P720),
            format: Some(OutputContainer::Ts),
            workers: Some(3),
            limit_mbps: Some(0.0),
        }
        .into_request()
        .unwrap();
        assert_eq!(request.quality, Some(QualityTier::P720));
        assert_eq!(request.container, Some(OutputContainer::Ts));
        assert_eq!(request.workers, Some(3));
        assert_eq!(request.speed_limit_mbps, Some(0.0));
    }

    #[test]
    fn test_negative_rate_limit_rejected() {
        let err = DownloadArgs {
            url: "u".to_string(),
            limit_mbps: Some(-1.0),
            ..Default::default()
        }
        .into_request()
        .unwrap_err();
        assert!(matches!(err, CliError::Arguments(_)));
    }

    #[tokio::test]
    async fn test_ctrl_c_task_can_be_aborted() {
        let cancel = CancellationToken::new();
        let handle = cancel_on_ctrl_c(cancel.clone());
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert!(!cancel.is_cancelled());
    }
}

//! Benchmark command handler.
//!
//! Runs the network benchmark, shows the recorded calibration or clears it.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vidgrab_core::{BenchmarkEvent, ChannelEmitter, Settings};

use crate::benchmark_commands::BenchmarkCommand;
use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::download::cancel_on_ctrl_c;
use crate::handlers::tools::ensure_with_progress;
use crate::presentation::{BenchmarkProgress, print_benchmark_result, print_row};
use crate::utils::input::prompt_confirmation;

/// Execute the benchmark command.
pub async fn execute(ctx: &CliContext, yes: bool, command: Option<BenchmarkCommand>) -> Result<()> {
    match command {
        None => run(ctx, yes).await,
        Some(BenchmarkCommand::Show) => show(ctx).await,
        Some(BenchmarkCommand::Reset { force }) => reset(ctx, force).await,
    }
}

async fn run(ctx: &CliContext, yes: bool) -> Result<()> {
    let settings = ctx.settings().get().await.map_err(CliError::from)?;
    let engine = ctx.benchmark_engine(&settings)?;
    let candidates = engine.candidates();

    println!(
        "The benchmark downloads two reference videos with {} worker counts ({:?}), {} runs in total.",
        candidates.len(),
        candidates,
        candidates.len() * 2
    );
    println!("This can take several minutes and transfer a few gigabytes.");
    if !yes && !prompt_confirmation("Run the network benchmark now?")? {
        println!("Benchmark skipped.");
        return Ok(());
    }

    // Merging needs ffmpeg; without it the runs still measure throughput
    let ffmpeg = match ensure_with_progress(ctx.ffmpeg().as_ref()).await {
        Ok(path) => Some(path),
        Err(e) => {
            warn!(error = %e, "ffmpeg unavailable for benchmark runs");
            None
        }
    };
    let engine = engine.with_ffmpeg_location(ffmpeg);

    let (emitter, mut events) = ChannelEmitter::<BenchmarkEvent>::channel();
    let cancel = CancellationToken::new();
    let signal = cancel_on_ctrl_c(cancel.clone());

    let render = tokio::spawn(async move {
        let progress = BenchmarkProgress::new();
        while let Some(event) = events.recv().await {
            progress.handle(&event);
        }
        progress.finish();
    });

    let result = engine.run(&emitter, &cancel).await;

    drop(emitter);
    signal.abort();
    if let Err(e) = render.await {
        debug!(error = %e, "Benchmark renderer stopped abnormally");
    }

    let result = result.map_err(CliError::from)?;
    ctx.settings()
        .record_benchmark(&result)
        .await
        .map_err(CliError::from)?;

    print_benchmark_result(&result);
    println!();
    println!("✓ Calibration saved; automatic downloads now use it.");
    Ok(())
}

fn print_calibration(settings: &Settings) {
    let Some(calibration) = settings.benchmark_calibration() else {
        println!("No benchmark recorded. Run `vidgrab benchmark` to calibrate.");
        return;
    };
    print_row("Optimal workers", calibration.optimal_workers);
    print_row(
        "Min size per worker",
        calibration
            .min_size_per_worker_mb
            .map_or_else(|| "default".to_string(), |mb| format!("{mb} MB")),
    );
    print_row(
        "Recorded at",
        settings
            .benchmark_completed_at
            .map_or_else(|| "unknown".to_string(), |at| at.to_rfc3339()),
    );
}

async fn show(ctx: &CliContext) -> Result<()> {
    let settings = ctx.settings().get().await.map_err(CliError::from)?;
    print_calibration(&settings);
    Ok(())
}

async fn reset(ctx: &CliContext, force: bool) -> Result<()> {
    if !force && !prompt_confirmation("Forget the recorded benchmark?")? {
        println!("Nothing changed.");
        return Ok(());
    }
    ctx.settings()
        .clear_benchmark()
        .await
        .map_err(CliError::from)?;
    println!("✓ Benchmark cleared; the fragment count follows CPU tiers again.");
    Ok(())
}

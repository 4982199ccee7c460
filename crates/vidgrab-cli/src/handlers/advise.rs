//! Advise command handler.

use anyhow::Result;
use vidgrab_core::ConcurrencyAdvisor;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::print_worker_decision;

/// Print the fragment count the advisor picks for `size_mb`.
pub async fn execute(ctx: &CliContext, size_mb: Option<f64>) -> Result<()> {
    if size_mb.is_some_and(|s| !s.is_finite() || s < 0.0) {
        return Err(CliError::Arguments("--size-mb must be a non-negative number".to_string()).into());
    }

    let settings = ctx.settings().get().await.map_err(CliError::from)?;
    let cpu_count = ctx.probe().cpu_count();
    let decision = ConcurrencyAdvisor::from_settings(cpu_count, &settings).decide(size_mb);

    print_worker_decision(&decision, cpu_count);
    if !settings.auto_concurrency {
        println!();
        println!(
            "Note: automatic concurrency is off; downloads use {} fragments.",
            settings.concurrent_fragments
        );
    }
    Ok(())
}

//! Info command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{print_metadata, print_separator, print_worker_decision};

/// Resolve metadata for `url` and show the worker count a download would get.
pub async fn execute(ctx: &CliContext, url: &str) -> Result<()> {
    let settings = ctx.settings().get().await.map_err(CliError::from)?;
    let orchestrator = ctx.orchestrator(&settings)?;
    let inspection = orchestrator
        .inspect(url, &settings)
        .await
        .map_err(CliError::from)?;

    print_metadata(&inspection.metadata);
    print_separator(40);
    print_worker_decision(&inspection.decision, ctx.probe().cpu_count());
    if !settings.auto_concurrency {
        println!();
        println!(
            "Note: automatic concurrency is off; this download would use {} fragments.",
            settings.concurrent_fragments
        );
    }
    Ok(())
}

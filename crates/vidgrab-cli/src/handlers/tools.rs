//! Tools command handler: ffmpeg and the cookie plugin.

use std::path::PathBuf;

use anyhow::Result;
use vidgrab_core::{InstallError, InstallProgress, InstallerPort};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{InstallProgressBar, print_row};
use crate::tools_commands::ToolsCommand;

/// Execute the tools command.
pub async fn execute(ctx: &CliContext, command: ToolsCommand) -> Result<()> {
    match command {
        ToolsCommand::Ffmpeg => install(ctx.ffmpeg().as_ref()).await,
        ToolsCommand::Plugin => install(ctx.cookie_plugin().as_ref()).await,
        ToolsCommand::Status => status(ctx).await,
    }
}

/// Run `installer.ensure` behind a progress bar.
pub async fn ensure_with_progress(installer: &dyn InstallerPort) -> Result<PathBuf, InstallError> {
    let bar = InstallProgressBar::new(installer.name());
    let report = |progress: InstallProgress| bar.update(progress);
    let result = installer.ensure(&report).await;
    bar.finish();
    result
}

async fn install(installer: &dyn InstallerPort) -> Result<()> {
    let path = ensure_with_progress(installer)
        .await
        .map_err(CliError::from)?;
    println!("✓ {} ready at {}", installer.name(), path.display());
    Ok(())
}

async fn status(ctx: &CliContext) -> Result<()> {
    let settings = ctx.settings().get().await.map_err(CliError::from)?;

    let ytdlp = match ctx.ytdlp(&settings) {
        Ok(provider) => match provider.version().await {
            Ok(version) => format!("{} ({version})", provider.binary().display()),
            Err(e) => format!("{} (not runnable: {e})", provider.binary().display()),
        },
        Err(e) => format!("missing ({e})"),
    };
    print_row("yt-dlp", ytdlp);

    for installer in [ctx.ffmpeg(), ctx.cookie_plugin()] {
        let location = installer.locate().await.map_or_else(
            || "not installed".to_string(),
            |path| path.display().to_string(),
        );
        print_row(installer.name(), location);
    }
    Ok(())
}

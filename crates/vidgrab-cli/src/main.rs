//! CLI entry point - the composition root.
//!
//! Infrastructure is wired together once in `bootstrap`; every command
//! handler receives the resulting `CliContext`.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use vidgrab_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

/// Install the fmt subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::with_defaults()
        .map_err(CliError::from)?
        .with_config_dir(cli.config_dir);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap(config).await?;

    match command {
        Commands::Download {
            url,
            quality,
            format,
            workers,
            limit_mbps,
        } => {
            let args = handlers::download::DownloadArgs {
                url,
                quality,
                format,
                workers,
                limit_mbps,
            };
            handlers::download::execute(&ctx, args).await?;
        }
        Commands::Info { url } => {
            handlers::info::execute(&ctx, &url).await?;
        }
        Commands::Advise { size_mb } => {
            handlers::advise::execute(&ctx, size_mb).await?;
        }
        Commands::Benchmark { yes, command } => {
            handlers::benchmark::execute(&ctx, yes, command).await?;
        }
        Commands::Config { command } => {
            handlers::config::execute(&ctx, command).await?;
        }
        Commands::Tools { command } => {
            handlers::tools::execute(&ctx, command).await?;
        }
        Commands::Paths => {
            handlers::paths::execute(ctx.paths());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before parsing so env-backed flags see it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

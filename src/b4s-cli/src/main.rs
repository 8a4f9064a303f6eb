mod cli;
mod commands;
mod config;
mod dispatch;
mod file_io;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::prelude::*;

use cli::*;

/// Install the stderr log subscriber; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Save { command } => dispatch::dispatch_save(command)?,

        Commands::Serial { command } => dispatch::dispatch_serial(command)?,

        Commands::Configure {
            user_id,
            platform,
            show,
        } => commands::configure::handle(user_id, platform, show)?,
    }

    Ok(())
}

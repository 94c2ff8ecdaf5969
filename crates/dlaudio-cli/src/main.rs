mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let filter = match cli.verbose {
        0 => "dlaudio=info,dlaudio_core=info",
        1 => "dlaudio=debug,dlaudio_core=debug",
        2 => "dlaudio=trace,dlaudio_core=trace",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\nError: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Some(Commands::Extract { url, options }) => {
            commands::extract::run(&url, &options, cli.config.as_deref()).await
        }
        Some(Commands::Doctor) => commands::doctor::run(cli.config.as_deref()).await,
        Some(Commands::Config) => commands::config::run(cli.config.as_deref()).await,
        None => {
            // If URL provided directly, treat as extract command
            if let Some(url) = cli.url {
                commands::extract::run(&url, &cli.options, cli.config.as_deref()).await
            } else {
                use clap::CommandFactory;
                Cli::command().print_help()?;
                println!();
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

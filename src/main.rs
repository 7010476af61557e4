// ABOUTME: Binary entry point for slipway.
// ABOUTME: Parses the CLI, configures logging, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, OutputFormat};
use slipway::config;
use slipway::error::Result;
use slipway::output::{Output, OutputMode};
use slipway::pipeline::{RunStatus, TriggerEvent};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mode = match cli.output {
        OutputFormat::Normal => OutputMode::Normal,
        OutputFormat::Quiet => OutputMode::Quiet,
        OutputFormat::Json => OutputMode::Json,
    };
    let output = Output::new(mode);

    match dispatch(cli, output).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn dispatch(cli: Cli, output: Output) -> Result<i32> {
    match cli.command {
        Commands::Init {
            service,
            repository,
            force,
        } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, service.as_deref(), repository.as_deref(), force)?;
            output.success("Wrote slipway.yml");
            Ok(0)
        }
        Commands::Run {
            environment,
            branch,
            commit,
            changed_paths,
            socket,
        } => {
            let trigger = TriggerEvent::new(branch, commit, changed_paths);
            let status = commands::run(environment, trigger, socket, output).await?;
            match status {
                RunStatus::Succeeded | RunStatus::Skipped => Ok(0),
                _ => Ok(1),
            }
        }
        Commands::Check => {
            commands::check(output)?;
            Ok(0)
        }
    }
}

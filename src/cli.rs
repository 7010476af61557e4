// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "slipway")]
#[command(about = "Build-and-rollout pipeline engine for container services")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Normal)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Normal,
    Quiet,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new slipway.yml configuration file
    Init {
        /// Service name to write into the template
        #[arg(long)]
        service: Option<String>,

        /// Registry repository to write into the template
        #[arg(long)]
        repository: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Execute one pipeline run for a trigger event
    Run {
        /// Deployment target defined in config
        #[arg(short, long)]
        environment: String,

        /// Branch the triggering push landed on
        #[arg(long)]
        branch: String,

        /// Commit SHA being deployed
        #[arg(long)]
        commit: String,

        /// Path changed by the push (repeatable)
        #[arg(long = "changed-path", value_name = "PATH")]
        changed_paths: Vec<String>,

        /// Container engine socket path
        #[arg(long)]
        socket: Option<String>,
    },

    /// Validate configuration and list targets without executing
    Check,
}

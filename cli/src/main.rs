// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Big Brother
//!
//! The `big-brother` binary starts, stops and checks a fleet of services in
//! dependency order.
//!
//! ## Commands
//!
//! - `big-brother start [-s SERVICE [-p PROCESS]] [-t N] [--ignore-check]`
//! - `big-brother stop [-s SERVICE [-p PROCESS]] [-t N]`
//! - `big-brother check [-s SERVICE [-p PROCESS]] [--json]`
//! - `big-brother config show|validate|tree|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use big_brother::commands::{self, CheckArgs, ConfigCommand, StartArgs, StopArgs};

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Big Brother - dependency-aware service orchestration
#[derive(Parser)]
#[command(name = "big-brother")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        global = true,
        env = "BIG_BROTHER_LOG_LEVEL",
        default_value = DEFAULT_LOG_LEVEL
    )]
    log_level: String,

    /// Log progress of every lifecycle step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start services in dependency order
    #[command(name = "start")]
    Start(StartArgs),

    /// Stop services, dependents first
    #[command(name = "stop")]
    Stop(StopArgs),

    /// Report process status
    #[command(name = "check")]
    Check(CheckArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose && cli.log_level == DEFAULT_LOG_LEVEL {
        "info"
    } else {
        cli.log_level.as_str()
    };
    init_logging(level)?;

    match cli.command {
        Some(Commands::Start(args)) => commands::lifecycle::start(args, cli.config).await,
        Some(Commands::Stop(args)) => commands::lifecycle::stop(args, cli.config).await,
        Some(Commands::Check(args)) => commands::check::check(args, cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging. Logs go to stderr so stdout
/// stays clean for tables and JSON.
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

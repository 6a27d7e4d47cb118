// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Start and stop commands
//!
//! Without a selector every service is walked in dependency order. `-s`
//! narrows the operation to one service, `-s` with `-p` to one process.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use big_brother_core::application::lifecycle::LifecycleController;
use big_brother_core::application::tree_walker::{WalkMode, WalkOutcome};

use super::{load_fleet, local_runner, Target};

#[derive(Args, Debug)]
pub struct StartArgs {
    #[command(flatten)]
    pub target: Target,

    /// Number of services to operate on concurrently
    #[arg(short, long, default_value_t = 1, value_name = "N")]
    pub threads: usize,

    /// Start a service even if its dependency is not running
    #[arg(long = "ignore-check", visible_alias = "ic")]
    pub ignore_check: bool,
}

#[derive(Args, Debug)]
pub struct StopArgs {
    #[command(flatten)]
    pub target: Target,

    /// Number of services to operate on concurrently
    #[arg(short, long, default_value_t = 1, value_name = "N")]
    pub threads: usize,
}

fn controller(config_override: Option<PathBuf>, threads: usize) -> Result<LifecycleController> {
    let config = load_fleet(config_override)?;
    let runner = local_runner(&config);
    let mode = WalkMode::from_thread_count(threads);
    info!(?mode, "Walk mode selected");
    Ok(LifecycleController::new(config, runner, mode))
}

pub async fn start(args: StartArgs, config_override: Option<PathBuf>) -> Result<()> {
    let ctl = controller(config_override, args.threads)?;

    match (args.target.service, args.target.process) {
        (None, _) => {
            let outcome = ctl.start_all().await;
            report_walk(&ctl, outcome, "start")
        }
        (Some(service), None) => {
            ctl.start_service(&service, args.ignore_check)
                .await
                .with_context(|| format!("Failed to start service '{}'", service))?;
            println!("{}", format!("✓ Service {} started", service).green());
            Ok(())
        }
        (Some(service), Some(process)) => {
            ctl.start_process(&service, &process)
                .await
                .with_context(|| format!("Failed to start process '{}/{}'", service, process))?;
            println!(
                "{}",
                format!("✓ Start command issued for {}/{}", service, process).green()
            );
            Ok(())
        }
    }
}

pub async fn stop(args: StopArgs, config_override: Option<PathBuf>) -> Result<()> {
    let ctl = controller(config_override, args.threads)?;

    match (args.target.service, args.target.process) {
        (None, _) => {
            let outcome = ctl.stop_all().await;
            report_walk(&ctl, outcome, "stop")
        }
        (Some(service), None) => {
            ctl.stop_service(&service)
                .await
                .with_context(|| format!("Failed to stop service '{}'", service))?;
            println!("{}", format!("✓ Service {} stopped", service).green());
            Ok(())
        }
        (Some(service), Some(process)) => {
            ctl.stop_process(&service, &process)
                .await
                .with_context(|| format!("Failed to stop process '{}/{}'", service, process))?;
            println!(
                "{}",
                format!("✓ Stop command issued for {}/{}", service, process).green()
            );
            Ok(())
        }
    }
}

fn report_walk(ctl: &LifecycleController, outcome: WalkOutcome, verb: &str) -> Result<()> {
    let topology = &ctl.config().topology;
    let completed = topology.names(&outcome.completed).join(", ");
    let skipped = topology.names(&outcome.skipped).join(", ");
    let total = topology.len();

    if !outcome.skipped.is_empty() {
        eprintln!("{} {}", "Skipped:".yellow(), skipped);
    }

    let done = outcome
        .into_result()
        .with_context(|| format!("Failed to {} all services (completed: [{}])", verb, completed))?;

    println!(
        "{}",
        format!("✓ {}/{} services {}", done.len(), total, past_tense(verb)).green()
    );
    Ok(())
}

fn past_tense(verb: &str) -> &'static str {
    match verb {
        "stop" => "stopped",
        _ => "started",
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Check command
//!
//! Read-only status query for the whole fleet, one service or one process.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use big_brother_core::application::status::StatusReporter;

use super::{load_fleet, local_runner, Target};
use crate::output;

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub target: Target,

    /// Print results as JSON
    #[arg(short, long)]
    pub json: bool,
}

pub async fn check(args: CheckArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = load_fleet(config_override)?;
    let runner = local_runner(&config);
    let status = StatusReporter::new(config, runner);

    let results = match (args.target.service, args.target.process) {
        (None, _) => status.check_all().await,
        (Some(service), None) => status
            .check_service_by_name(&service)
            .await
            .with_context(|| format!("Failed to check service '{}'", service))?,
        (Some(service), Some(process)) => vec![status
            .check_process(&service, &process)
            .await
            .with_context(|| format!("Failed to check process '{}/{}'", service, process))?],
    };

    if args.json {
        println!("{}", output::render_json(&results)?);
    } else {
        print!("{}", output::render_table(results));
    }
    Ok(())
}

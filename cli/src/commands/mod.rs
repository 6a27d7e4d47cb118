// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Big Brother CLI

pub mod check;
pub mod config;
pub mod lifecycle;

pub use self::check::CheckArgs;
pub use self::config::ConfigCommand;
pub use self::lifecycle::{StartArgs, StopArgs};

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use big_brother_core::domain::fleet::FleetConfig;
use big_brother_core::domain::runner::CommandRunner;
use big_brother_core::infrastructure::{FleetManifest, LocalCommandRunner};

/// Service/process selector shared by start, stop and check.
#[derive(Args, Debug, Clone, Default)]
pub struct Target {
    /// Service to operate on (default: every service)
    #[arg(short, long, value_name = "SERVICE")]
    pub service: Option<String>,

    /// Process within the service
    #[arg(short, long, value_name = "PROCESS", requires = "service")]
    pub process: Option<String>,
}

/// Load the manifest and build the validated fleet configuration.
pub fn load_fleet(config_override: Option<PathBuf>) -> Result<Arc<FleetConfig>> {
    let manifest = FleetManifest::load(config_override).context("Failed to load configuration")?;
    let config = manifest
        .into_fleet_config()
        .context("Configuration validation failed")?;
    Ok(Arc::new(config))
}

pub fn local_runner(config: &FleetConfig) -> Arc<dyn CommandRunner> {
    Arc::new(LocalCommandRunner::new(config.command_timeout))
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, tree, generate

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use big_brother_core::infrastructure::fleet_parser::CONFIG_PATH_ENV;
use big_brother_core::infrastructure::FleetManifest;

use crate::output;

pub const SAMPLE_CONFIG: &str = include_str!("../../templates/fleet-sample.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file and dependency graph
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Print the service dependency tree
    Tree,

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./config/config.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Tree => tree(config_override),
        ConfigCommand::Generate { output, force } => generate(&output, force),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  --config flag: {}", path.display()),
            None => println!("  --config flag: {}", "(not set)".dimmed()),
        }
        if std::env::var(CONFIG_PATH_ENV).is_err() {
            println!("  {}: {}", CONFIG_PATH_ENV, "(not set)".dimmed());
        }
        for (i, path) in FleetManifest::candidate_paths().iter().enumerate() {
            let marker = if path.exists() { "✓".green() } else { "✗".dimmed() };
            println!("  {}. {} {}", i + 1, path.display(), marker);
        }
        println!();
    }

    let manifest = FleetManifest::load(config_override).context("Failed to load configuration")?;

    println!("{}", "Current configuration:".bold());
    if let Some(source) = &manifest.source {
        println!("  Source: {}", source.display());
    }
    println!("  Wait time: {}s", manifest.wait_time);
    if manifest.command_timeout.is_zero() {
        println!("  Command timeout: {}", "(none)".dimmed());
    } else {
        println!("  Command timeout: {:?}", manifest.command_timeout);
    }
    println!();

    println!("{}", "Services:".bold());
    for service in &manifest.services {
        match service.depends_on.as_deref().filter(|d| !d.is_empty()) {
            Some(dependency) => println!("  {} (depends on {})", service.name.bold(), dependency),
            None => println!("  {}", service.name.bold()),
        }
        for process in &service.processes {
            println!("    - {} @ {}", process.name, process.host_name);
            println!("        start:  {}", process.start_cmd);
            println!("        stop:   {}", process.stop_cmd);
            println!("        status: {}", process.status_cmd);
        }
    }

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let manifest = FleetManifest::load(config_path).context("Failed to load configuration")?;
    let config = manifest
        .into_fleet_config()
        .context("Configuration validation failed")?;

    let processes: usize = config
        .topology
        .services()
        .iter()
        .map(|s| s.processes.len())
        .sum();
    println!(
        "{}",
        format!(
            "✓ Configuration is valid ({} services, {} processes, {} roots)",
            config.topology.len(),
            processes,
            config.topology.roots().len()
        )
        .green()
    );

    Ok(())
}

fn tree(config_override: Option<PathBuf>) -> Result<()> {
    let config = super::load_fleet(config_override)?;
    print!("{}", output::render_tree(&config.topology));
    Ok(())
}

fn generate(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    std::fs::write(output, SAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Fleet YAML Parser
//!
//! Loads the fleet manifest from disk and translates it into the domain
//! [`FleetConfig`].
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external YAML → Domain objects
//! - **Anti-Corruption:** `host_name`, `wait_time` and the empty-string
//!   `depends_on` convention stay in this module
//!
//! # Manifest Format
//!
//! ```yaml
//! wait_time: 5
//! command_timeout: 5m
//! services:
//!   - name: db
//!     processes:
//!       - name: main
//!         host_name: db-01
//!         start_cmd: systemctl start postgresql
//!         stop_cmd: systemctl stop postgresql
//!         status_cmd: systemctl is-active postgresql
//!   - name: api
//!     depends_on: db
//!     processes: []
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::fleet::{FleetConfig, Process, ServiceSpec};
use crate::domain::graph::{GraphError, Topology};

pub const CONFIG_PATH_ENV: &str = "BIG_BROTHER_CONFIG_PATH";
pub const WAIT_TIME_ENV: &str = "BIG_BROTHER_WAIT_TIME";
pub const COMMAND_TIMEOUT_ENV: &str = "BIG_BROTHER_COMMAND_TIMEOUT";

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid service topology: {0}")]
    Graph(#[from] GraphError),

    #[error("no configuration file found (searched: {})", display_paths(.0))]
    NotFound(Vec<PathBuf>),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// YAML Schema (External Representation)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetManifest {
    /// Settle delay in seconds.
    #[serde(default)]
    pub wait_time: u64,

    /// Deadline for every command. `0s` disables it.
    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,

    #[serde(default)]
    pub services: Vec<ServiceYaml>,

    /// File the manifest was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

fn default_command_timeout() -> Duration {
    DEFAULT_COMMAND_TIMEOUT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceYaml {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    #[serde(default)]
    pub processes: Vec<ProcessYaml>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessYaml {
    pub name: String,
    pub host_name: String,
    pub start_cmd: String,
    pub stop_cmd: String,
    pub status_cmd: String,
}

impl From<ProcessYaml> for Process {
    fn from(yaml: ProcessYaml) -> Self {
        Process {
            name: yaml.name,
            host: yaml.host_name,
            start_cmd: yaml.start_cmd,
            stop_cmd: yaml.stop_cmd,
            status_cmd: yaml.status_cmd,
        }
    }
}

impl From<ServiceYaml> for ServiceSpec {
    fn from(yaml: ServiceYaml) -> Self {
        let spec = yaml
            .processes
            .into_iter()
            .fold(ServiceSpec::new(yaml.name), |spec, p| {
                spec.with_process(p.into())
            });
        match yaml.depends_on {
            Some(dependency) => spec.depends_on(dependency),
            None => spec,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl FleetManifest {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest = Self::from_yaml_str(&content)?;
        manifest.source = Some(path.to_path_buf());
        Ok(manifest)
    }

    /// Candidate locations in precedence order:
    /// 1. `BIG_BROTHER_CONFIG_PATH`
    /// 2. `./config/config.yaml`
    /// 3. `~/.big-brother/config.yaml`
    /// 4. `/etc/big-brother/config.yaml` (Unix) or `C:\ProgramData\BigBrother\config.yaml`
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            candidates.push(PathBuf::from(path));
        }
        candidates.push(PathBuf::from("./config/config.yaml"));
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".big-brother").join("config.yaml"));
        }
        #[cfg(unix)]
        candidates.push(PathBuf::from("/etc/big-brother/config.yaml"));
        #[cfg(windows)]
        candidates.push(PathBuf::from("C:\\ProgramData\\BigBrother\\config.yaml"));
        candidates
    }

    pub fn discover_config() -> Option<PathBuf> {
        Self::candidate_paths().into_iter().find(|p| p.exists())
    }

    /// Load from an explicit path (which must exist) or discover one, then
    /// apply environment overrides.
    pub fn load(cli_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = match cli_path {
            Some(path) => {
                info!("Loading configuration from explicit path: {:?}", path);
                path
            }
            None => {
                let path = Self::discover_config()
                    .ok_or_else(|| ConfigError::NotFound(Self::candidate_paths()))?;
                info!("Loading configuration from discovered path: {:?}", path);
                path
            }
        };

        let mut manifest = Self::from_yaml_file(&path)?;
        manifest.apply_env_overrides();
        Ok(manifest)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup(WAIT_TIME_ENV) {
            match val.trim().parse::<u64>() {
                Ok(seconds) => {
                    info!("Environment override: {}={}", WAIT_TIME_ENV, seconds);
                    self.wait_time = seconds;
                }
                Err(_) => warn!(
                    "Invalid value for {}: '{}'. Expected whole seconds. Ignoring.",
                    WAIT_TIME_ENV, val
                ),
            }
        }

        if let Some(val) = lookup(COMMAND_TIMEOUT_ENV) {
            match humantime::parse_duration(val.trim()) {
                Ok(timeout) => {
                    info!("Environment override: {}={}", COMMAND_TIMEOUT_ENV, val.trim());
                    self.command_timeout = timeout;
                }
                Err(e) => warn!(
                    "Invalid value for {}: '{}' ({}). Ignoring.",
                    COMMAND_TIMEOUT_ENV, val, e
                ),
            }
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.wait_time)
    }

    pub fn service_specs(&self) -> Vec<ServiceSpec> {
        self.services.iter().cloned().map(ServiceSpec::from).collect()
    }

    /// Build and validate the topology.
    pub fn into_fleet_config(self) -> Result<FleetConfig, ConfigError> {
        let topology = Topology::build(self.service_specs())?;
        let config = FleetConfig::new(self.settle_delay(), topology);
        Ok(if self.command_timeout.is_zero() {
            config
        } else {
            config.with_command_timeout(self.command_timeout)
        })
    }
}

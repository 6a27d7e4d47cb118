// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Lifecycle errors and phases.

use serde::{Deserialize, Serialize};

use crate::domain::runner::RunnerError;

/// Which command of a process an operation issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Start,
    Stop,
    Status,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Start => write!(f, "start"),
            Phase::Stop => write!(f, "stop"),
            Phase::Status => write!(f, "status"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error("process not found: {process} in service: {service}")]
    ProcessNotFound { service: String, process: String },

    #[error("dependency {dependency} is not running, cannot start {service}")]
    DependencyNotRunning { dependency: String, service: String },

    #[error("process {process} of service {service} on host {host} failed to start")]
    StartFailed {
        service: String,
        process: String,
        host: String,
    },

    #[error("process {process} of service {service} on host {host} failed to stop")]
    StopFailed {
        service: String,
        process: String,
        host: String,
    },

    #[error("{phase} command for process {process} of service {service} on host {host} failed: {source}")]
    Command {
        service: String,
        process: String,
        host: String,
        phase: Phase,
        #[source]
        source: RunnerError,
    },
}

impl LifecycleError {
    /// Name of the service the failure originated in.
    pub fn service(&self) -> &str {
        match self {
            LifecycleError::ServiceNotFound(service)
            | LifecycleError::ProcessNotFound { service, .. }
            | LifecycleError::DependencyNotRunning { service, .. }
            | LifecycleError::StartFailed { service, .. }
            | LifecycleError::StopFailed { service, .. }
            | LifecycleError::Command { service, .. } => service,
        }
    }
}

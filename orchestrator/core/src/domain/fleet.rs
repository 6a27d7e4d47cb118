// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Fleet Topology Model
//!
//! Entities describing a fleet of named services, each composed of one or
//! more processes hosted on possibly distinct machines.
//!
//! # Architectural Context
//!
//! - **Layer:** Domain
//! - **Aggregate Root:** [`FleetConfig`]
//! - **Related:** [`crate::domain::graph`] derives the dependency forest
//!
//! # Ownership
//!
//! Services live in a single canonical table owned by
//! [`Topology`](crate::domain::graph::Topology). The `dependencies` and
//! `dependents` relations are non-owning [`ServiceId`] indices into that
//! table, so the bidirectional links never form reference cycles.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::graph::Topology;

/// Index of a service inside its [`Topology`]'s service table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceId(pub(crate) usize);

impl ServiceId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single controllable process. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub name: String,
    pub host: String,
    pub start_cmd: String,
    pub stop_cmd: String,
    pub status_cmd: String,
}

/// A service as declared in configuration, before graph construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    /// Name of the single upstream service, `None` for a root.
    pub depends_on: Option<String>,
    pub processes: Vec<Process>,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends_on: None,
            processes: Vec::new(),
        }
    }

    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        let dependency = dependency.into();
        self.depends_on = if dependency.is_empty() {
            None
        } else {
            Some(dependency)
        };
        self
    }

    pub fn with_process(mut self, process: Process) -> Self {
        self.processes.push(process);
        self
    }
}

/// A service after graph construction.
///
/// `dependencies` holds at most one element under the forest model but is a
/// list so the relation can grow to a general DAG without changing callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub depends_on: Option<String>,
    pub processes: Vec<Process>,
    pub(crate) dependencies: Vec<ServiceId>,
    pub(crate) dependents: Vec<ServiceId>,
}

impl Service {
    pub(crate) fn from_spec(spec: ServiceSpec) -> Self {
        Self {
            name: spec.name,
            depends_on: spec.depends_on.filter(|d| !d.is_empty()),
            processes: spec.processes,
            dependencies: Vec::new(),
            dependents: Vec::new(),
        }
    }

    /// Services this one depends on.
    pub fn dependencies(&self) -> &[ServiceId] {
        &self.dependencies
    }

    /// Services that declare this one as their `depends_on`.
    pub fn dependents(&self) -> &[ServiceId] {
        &self.dependents
    }

    pub fn is_root(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.dependents.is_empty()
    }

    pub fn find_process(&self, name: &str) -> Option<&Process> {
        self.processes.iter().find(|p| p.name == name)
    }
}

/// Top-level fleet configuration: settle delay, command deadline and the
/// validated topology. Built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Fixed wait after a start/stop command before verifying status.
    pub settle_delay: Duration,
    /// Deadline applied to every command invocation. `None` waits forever.
    pub command_timeout: Option<Duration>,
    pub topology: Arc<Topology>,
}

impl FleetConfig {
    pub fn new(settle_delay: Duration, topology: Topology) -> Self {
        Self {
            settle_delay,
            command_timeout: None,
            topology: Arc::new(topology),
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }
}

/// Point-in-time status snapshot of one process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckResult {
    pub service_name: String,
    pub process_name: String,
    pub host_name: String,
    pub is_running: bool,
}

impl CheckResult {
    pub fn new(service: &Service, process: &Process, is_running: bool) -> Self {
        Self {
            service_name: service.name.clone(),
            process_name: process.name.clone(),
            host_name: process.host.clone(),
            is_running,
        }
    }

    /// Human-readable status used by table output and sorting.
    pub fn status_label(&self) -> &'static str {
        if self.is_running {
            "Running"
        } else {
            "Not Running"
        }
    }
}

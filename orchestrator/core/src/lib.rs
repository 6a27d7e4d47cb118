// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Big Brother Core
//!
//! Dependency-aware start, stop and status orchestration for services made
//! of processes on one or more hosts.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Topology model, tree execution engine, lifecycle controller
//!   and status reporter behind a pluggable command runner

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::fleet::{CheckResult, FleetConfig, Process, Service, ServiceId, ServiceSpec};
pub use domain::graph::{GraphError, Topology};
pub use domain::lifecycle::{LifecycleError, Phase};
pub use domain::runner::{CommandRunner, RunnerError};

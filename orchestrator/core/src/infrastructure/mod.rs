// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Command execution and configuration loading

pub mod fleet_parser;
pub mod local_runner;

pub use fleet_parser::{ConfigError, FleetManifest};
pub use local_runner::LocalCommandRunner;

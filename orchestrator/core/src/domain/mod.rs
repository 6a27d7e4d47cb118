// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Fleet topology, dependency graph, command runner contract and lifecycle
//! errors.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Entities, invariants and the seams implemented by infrastructure

pub mod fleet;
pub mod graph;
pub mod lifecycle;
pub mod runner;

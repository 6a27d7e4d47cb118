// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod lifecycle;
pub mod status;
pub mod tree_walker;

// Re-export use cases for convenience
pub use lifecycle::{LifecycleController, TransitionAction};
pub use status::StatusReporter;
pub use tree_walker::{Direction, ServiceAction, TreeWalker, WalkMode, WalkOutcome, MAX_PARALLELISM};

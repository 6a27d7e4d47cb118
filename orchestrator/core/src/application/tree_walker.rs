// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Tree Execution Engine
//!
//! Applies a [`ServiceAction`] across the dependency forest, either
//! sequentially (depth-first, pre-order) or with bounded parallelism.
//!
//! # Ordering
//!
//! - [`Direction::Downstream`] (start): entry nodes are the roots; a service
//!   becomes eligible once all of its dependencies completed.
//! - [`Direction::Upstream`] (stop): entry nodes are the leaves; a service
//!   becomes eligible once all of its dependents completed.
//!
//! Siblings have no ordering guarantee relative to each other in parallel
//! mode.
//!
//! # Failure Policy
//!
//! The first failure stops progress. Sequential mode returns immediately.
//! Parallel mode cancels a shared [`CancellationToken`] from inside the
//! failing unit, before its admission permit is released; units still waiting
//! at the admission gate observe it and skip, units already in flight run to
//! completion. The caller receives a [`WalkOutcome`] naming the failing
//! service together with everything that completed before it.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::domain::fleet::{Service, ServiceId};
use crate::domain::graph::Topology;
use crate::domain::lifecycle::LifecycleError;

/// Hard ceiling on concurrently running units.
pub const MAX_PARALLELISM: usize = 192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    Sequential,
    /// Bounded concurrency with an admission gate of the given capacity.
    Parallel(usize),
}

impl WalkMode {
    /// `n <= 1` walks sequentially; anything larger is capped at
    /// [`MAX_PARALLELISM`].
    pub fn from_thread_count(n: usize) -> Self {
        if n <= 1 {
            WalkMode::Sequential
        } else {
            WalkMode::Parallel(n.min(MAX_PARALLELISM))
        }
    }

    pub fn parallelism(self) -> usize {
        match self {
            WalkMode::Sequential => 1,
            WalkMode::Parallel(k) => k.clamp(1, MAX_PARALLELISM),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Roots first, recursing through `dependents`.
    Downstream,
    /// Leaves first, recursing through `dependencies`.
    Upstream,
}

/// Work applied to each service during a walk.
#[async_trait]
pub trait ServiceAction: Send + Sync {
    async fn apply(&self, service: &Service) -> Result<(), LifecycleError>;
}

/// What happened during a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOutcome {
    /// Services whose action succeeded, in completion order.
    pub completed: Vec<ServiceId>,
    /// Eligible services that were never started because of a failure.
    pub skipped: Vec<ServiceId>,
    /// The first failure and the service it came from.
    pub failure: Option<(ServiceId, LifecycleError)>,
}

impl WalkOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn into_result(self) -> Result<Vec<ServiceId>, LifecycleError> {
        match self.failure {
            Some((_, e)) => Err(e),
            None => Ok(self.completed),
        }
    }
}

enum UnitResult {
    Done,
    Failed(LifecycleError),
    Skipped,
}

pub struct TreeWalker {
    topology: Arc<Topology>,
    mode: WalkMode,
}

impl TreeWalker {
    pub fn new(topology: Arc<Topology>, mode: WalkMode) -> Self {
        Self { topology, mode }
    }

    pub fn mode(&self) -> WalkMode {
        self.mode
    }

    /// Walk the whole forest starting from the roots or the leaves.
    pub async fn walk(&self, direction: Direction, action: Arc<dyn ServiceAction>) -> WalkOutcome {
        let entries = match direction {
            Direction::Downstream => self.topology.roots().to_vec(),
            Direction::Upstream => self.topology.leaves(),
        };
        self.walk_from(&entries, direction, action).await
    }

    /// Walk starting from explicit entry nodes.
    ///
    /// A non-entry service is only reached once every predecessor in the walk
    /// direction completed, so an upstream walk from a subset of leaves never
    /// stops a dependency that still has other dependents running.
    pub async fn walk_from(
        &self,
        entries: &[ServiceId],
        direction: Direction,
        action: Arc<dyn ServiceAction>,
    ) -> WalkOutcome {
        info!(
            entries = entries.len(),
            services = self.topology.len(),
            ?direction,
            mode = ?self.mode,
            "Walking dependency forest"
        );
        match self.mode {
            WalkMode::Parallel(k) if k > 1 => {
                self.walk_parallel(entries, direction, action, k.min(MAX_PARALLELISM))
                    .await
            }
            _ => self.walk_sequential(entries, direction, action).await,
        }
    }

    async fn walk_sequential(
        &self,
        entries: &[ServiceId],
        direction: Direction,
        action: Arc<dyn ServiceAction>,
    ) -> WalkOutcome {
        let mut pending = self.pending_counts(direction);
        let mut dispatched = vec![false; self.topology.len()];
        let mut outcome = WalkOutcome::default();

        let mut stack: Vec<ServiceId> = entries.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut dispatched[id.index()], true) {
                continue;
            }
            let service = self.topology.service(id);
            debug!(service = %service.name, "Applying action");

            if let Err(e) = action.apply(service).await {
                error!(service = %service.name, error = %e, "Action failed, aborting walk");
                outcome.skipped = stack.into_iter().rev().collect();
                outcome.failure = Some((id, e));
                return outcome;
            }
            outcome.completed.push(id);

            // Reverse so the first successor is visited first.
            for &next in self.successors(id, direction).iter().rev() {
                pending[next.index()] = pending[next.index()].saturating_sub(1);
                if pending[next.index()] == 0 {
                    stack.push(next);
                }
            }
        }
        outcome
    }

    async fn walk_parallel(
        &self,
        entries: &[ServiceId],
        direction: Direction,
        action: Arc<dyn ServiceAction>,
        capacity: usize,
    ) -> WalkOutcome {
        let gate = Arc::new(Semaphore::new(capacity));
        let cancel = CancellationToken::new();
        let mut pending = self.pending_counts(direction);
        let mut dispatched = vec![false; self.topology.len()];
        let mut units = JoinSet::new();
        let mut outcome = WalkOutcome::default();

        for &id in entries {
            if !std::mem::replace(&mut dispatched[id.index()], true) {
                self.spawn_unit(&mut units, id, &gate, &cancel, &action);
            }
        }

        while let Some(joined) = units.join_next().await {
            let (id, result) = match joined {
                Ok(unit) => unit,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    error!(error = %e, "Walk unit was cancelled");
                    continue;
                }
            };
            let name = &self.topology.service(id).name;

            match result {
                UnitResult::Done => {
                    outcome.completed.push(id);
                    if cancel.is_cancelled() {
                        continue;
                    }
                    for &next in self.successors(id, direction) {
                        pending[next.index()] = pending[next.index()].saturating_sub(1);
                        if pending[next.index()] == 0
                            && !std::mem::replace(&mut dispatched[next.index()], true)
                        {
                            self.spawn_unit(&mut units, next, &gate, &cancel, &action);
                        }
                    }
                }
                UnitResult::Failed(e) => {
                    if outcome.failure.is_none() {
                        error!(service = %name, error = %e, "Action failed, cancelling walk");
                        outcome.failure = Some((id, e));
                    } else {
                        error!(service = %name, error = %e, "Additional failure after cancellation");
                    }
                }
                UnitResult::Skipped => {
                    debug!(service = %name, "Skipped after cancellation");
                    outcome.skipped.push(id);
                }
            }
        }
        outcome
    }

    fn spawn_unit(
        &self,
        units: &mut JoinSet<(ServiceId, UnitResult)>,
        id: ServiceId,
        gate: &Arc<Semaphore>,
        cancel: &CancellationToken,
        action: &Arc<dyn ServiceAction>,
    ) {
        let topology = self.topology.clone();
        let gate = gate.clone();
        let cancel = cancel.clone();
        let action = action.clone();

        units.spawn(async move {
            // The gate is never closed; a closed gate would also mean "stop".
            let Ok(_permit) = gate.acquire_owned().await else {
                return (id, UnitResult::Skipped);
            };
            if cancel.is_cancelled() {
                return (id, UnitResult::Skipped);
            }
            let service = topology.service(id);
            debug!(service = %service.name, "Applying action");
            match action.apply(service).await {
                Ok(()) => (id, UnitResult::Done),
                Err(e) => {
                    // Cancel before the permit drops so no waiter slips in.
                    cancel.cancel();
                    (id, UnitResult::Failed(e))
                }
            }
        });
    }

    fn successors(&self, id: ServiceId, direction: Direction) -> &[ServiceId] {
        let service = self.topology.service(id);
        match direction {
            Direction::Downstream => service.dependents(),
            Direction::Upstream => service.dependencies(),
        }
    }

    fn pending_counts(&self, direction: Direction) -> Vec<usize> {
        self.topology
            .services()
            .iter()
            .map(|s| match direction {
                Direction::Downstream => s.dependencies().len(),
                Direction::Upstream => s.dependents().len(),
            })
            .collect()
    }
}

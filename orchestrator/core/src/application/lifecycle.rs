// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Lifecycle Controller
//!
//! Start/stop operations layered on the [`TreeWalker`]. Every service-level
//! transition issues the command for each process in declaration order,
//! waits the configured settle delay and then probes the status command to
//! confirm the transition. Single-process operations only issue the command.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::status::StatusReporter;
use crate::application::tree_walker::{Direction, ServiceAction, TreeWalker, WalkMode, WalkOutcome};
use crate::domain::fleet::{FleetConfig, Process, Service};
use crate::domain::lifecycle::{LifecycleError, Phase};
use crate::domain::runner::{CommandRunner, RunnerError};

/// Start or stop every process of a service and verify the result.
pub struct TransitionAction {
    config: Arc<FleetConfig>,
    runner: Arc<dyn CommandRunner>,
    status: StatusReporter,
    phase: Phase,
}

impl TransitionAction {
    fn new(
        config: Arc<FleetConfig>,
        runner: Arc<dyn CommandRunner>,
        status: StatusReporter,
        phase: Phase,
    ) -> Self {
        debug_assert!(phase != Phase::Status, "status is not a transition");
        Self {
            config,
            runner,
            status,
            phase,
        }
    }

    fn command<'a>(&self, process: &'a Process) -> &'a str {
        match self.phase {
            Phase::Stop => &process.stop_cmd,
            _ => &process.start_cmd,
        }
    }

    fn verification_failure(&self, service: &Service, process: &Process) -> LifecycleError {
        let (service, process, host) = (
            service.name.clone(),
            process.name.clone(),
            process.host.clone(),
        );
        match self.phase {
            Phase::Stop => LifecycleError::StopFailed {
                service,
                process,
                host,
            },
            _ => LifecycleError::StartFailed {
                service,
                process,
                host,
            },
        }
    }
}

#[async_trait]
impl ServiceAction for TransitionAction {
    async fn apply(&self, service: &Service) -> Result<(), LifecycleError> {
        let expect_running = self.phase == Phase::Start;
        info!(service = %service.name, phase = %self.phase, "Transitioning service");

        for process in &service.processes {
            info!(
                service = %service.name,
                process = %process.name,
                host = %process.host,
                phase = %self.phase,
                "Issuing command"
            );
            let output = self
                .runner
                .execute(self.command(process), &process.host)
                .await
                .map_err(|source| command_error(service, process, self.phase, source))?;
            debug!(process = %process.name, output = %output.trim_end(), "Command finished");

            tokio::time::sleep(self.config.settle_delay).await;

            let running = self
                .status
                .probe(process)
                .await
                .map_err(|source| command_error(service, process, Phase::Status, source))?;
            if running != expect_running {
                warn!(
                    service = %service.name,
                    process = %process.name,
                    host = %process.host,
                    running,
                    "Process did not reach expected state"
                );
                return Err(self.verification_failure(service, process));
            }
        }

        info!(service = %service.name, phase = %self.phase, "Service transitioned successfully");
        Ok(())
    }
}

fn command_error(
    service: &Service,
    process: &Process,
    phase: Phase,
    source: RunnerError,
) -> LifecycleError {
    LifecycleError::Command {
        service: service.name.clone(),
        process: process.name.clone(),
        host: process.host.clone(),
        phase,
        source,
    }
}

pub struct LifecycleController {
    config: Arc<FleetConfig>,
    runner: Arc<dyn CommandRunner>,
    status: StatusReporter,
    walker: TreeWalker,
}

impl LifecycleController {
    pub fn new(config: Arc<FleetConfig>, runner: Arc<dyn CommandRunner>, mode: WalkMode) -> Self {
        let status = StatusReporter::new(config.clone(), runner.clone());
        let walker = TreeWalker::new(config.topology.clone(), mode);
        Self {
            config,
            runner,
            status,
            walker,
        }
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    fn action(&self, phase: Phase) -> Arc<dyn ServiceAction> {
        Arc::new(TransitionAction::new(
            self.config.clone(),
            self.runner.clone(),
            self.status.clone(),
            phase,
        ))
    }

    /// Start every service, dependencies before dependents.
    pub async fn start_all(&self) -> WalkOutcome {
        info!("Starting all services");
        let outcome = self
            .walker
            .walk(Direction::Downstream, self.action(Phase::Start))
            .await;
        if outcome.is_success() {
            info!(services = outcome.completed.len(), "All services started successfully");
        }
        outcome
    }

    /// Stop every service, dependents before dependencies.
    pub async fn stop_all(&self) -> WalkOutcome {
        info!("Stopping all services");
        let outcome = self
            .walker
            .walk(Direction::Upstream, self.action(Phase::Stop))
            .await;
        if outcome.is_success() {
            info!(services = outcome.completed.len(), "All services stopped successfully");
        }
        outcome
    }

    /// Start one service. Unless `ignore_check` is set, every dependency must
    /// currently be running.
    pub async fn start_service(&self, name: &str, ignore_check: bool) -> Result<(), LifecycleError> {
        let service = self.find_service(name)?;

        if ignore_check {
            debug!(service = %service.name, "Skipping dependency check");
        } else {
            for &dep in service.dependencies() {
                let dependency = self.config.topology.service(dep);
                if !self.status.is_service_running(dependency).await {
                    return Err(LifecycleError::DependencyNotRunning {
                        dependency: dependency.name.clone(),
                        service: service.name.clone(),
                    });
                }
            }
        }

        self.action(Phase::Start).apply(service).await
    }

    /// Stop one service. Its dependents are not consulted.
    pub async fn stop_service(&self, name: &str) -> Result<(), LifecycleError> {
        let service = self.find_service(name)?;
        self.action(Phase::Stop).apply(service).await
    }

    /// Issue a process's start command without waiting or verifying.
    pub async fn start_process(&self, service: &str, process: &str) -> Result<(), LifecycleError> {
        self.issue(service, process, Phase::Start).await
    }

    /// Issue a process's stop command without waiting or verifying.
    pub async fn stop_process(&self, service: &str, process: &str) -> Result<(), LifecycleError> {
        self.issue(service, process, Phase::Stop).await
    }

    async fn issue(&self, service_name: &str, process_name: &str, phase: Phase) -> Result<(), LifecycleError> {
        let service = self.find_service(service_name)?;
        let process =
            service
                .find_process(process_name)
                .ok_or_else(|| LifecycleError::ProcessNotFound {
                    service: service_name.to_string(),
                    process: process_name.to_string(),
                })?;

        let command = match phase {
            Phase::Stop => &process.stop_cmd,
            _ => &process.start_cmd,
        };
        info!(
            service = %service.name,
            process = %process.name,
            host = %process.host,
            %phase,
            "Issuing command without verification"
        );
        self.runner
            .execute(command, &process.host)
            .await
            .map(|_| ())
            .map_err(|source| command_error(service, process, phase, source))
    }

    fn find_service(&self, name: &str) -> Result<&Service, LifecycleError> {
        self.config
            .topology
            .find(name)
            .ok_or_else(|| LifecycleError::ServiceNotFound(name.to_string()))
    }
}

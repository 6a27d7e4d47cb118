// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Status Reporter
//!
//! Read-only point queries against the fleet. No dependency ordering is
//! applied: every probe is independent.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::tree_walker::MAX_PARALLELISM;
use crate::domain::fleet::{CheckResult, FleetConfig, Process, Service};
use crate::domain::lifecycle::{LifecycleError, Phase};
use crate::domain::runner::{classify_status, CommandRunner, RunnerError};

#[derive(Clone)]
pub struct StatusReporter {
    config: Arc<FleetConfig>,
    runner: Arc<dyn CommandRunner>,
}

impl StatusReporter {
    pub fn new(config: Arc<FleetConfig>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// Issue the process's status command and classify the result.
    pub async fn probe(&self, process: &Process) -> Result<bool, RunnerError> {
        let result = self
            .runner
            .execute(&process.status_cmd, &process.host)
            .await;
        classify_status(result)
    }

    /// Check one named process. Lookup and probe errors are returned.
    pub async fn check_process(
        &self,
        service_name: &str,
        process_name: &str,
    ) -> Result<CheckResult, LifecycleError> {
        let service = self.find_service(service_name)?;
        let process =
            service
                .find_process(process_name)
                .ok_or_else(|| LifecycleError::ProcessNotFound {
                    service: service_name.to_string(),
                    process: process_name.to_string(),
                })?;

        let is_running = self
            .probe(process)
            .await
            .map_err(|source| LifecycleError::Command {
                service: service.name.clone(),
                process: process.name.clone(),
                host: process.host.clone(),
                phase: Phase::Status,
                source,
            })?;
        Ok(CheckResult::new(service, process, is_running))
    }

    /// Check every process of `service` in declaration order.
    ///
    /// A failing probe is logged and reported as not running.
    pub async fn check_service(&self, service: &Service) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(service.processes.len());
        for process in &service.processes {
            let is_running = match self.probe(process).await {
                Ok(running) => running,
                Err(e) => {
                    warn!(
                        service = %service.name,
                        process = %process.name,
                        host = %process.host,
                        error = %e,
                        "Status probe failed, assuming not running"
                    );
                    false
                }
            };
            debug!(service = %service.name, process = %process.name, is_running, "Checked process");
            results.push(CheckResult::new(service, process, is_running));
        }
        results
    }

    pub async fn check_service_by_name(&self, name: &str) -> Result<Vec<CheckResult>, LifecycleError> {
        let service = self.find_service(name)?;
        Ok(self.check_service(service).await)
    }

    /// Check every configured service. At most [`MAX_PARALLELISM`] services
    /// are probed at once; result order is unspecified, callers sort for
    /// presentation.
    pub async fn check_all(&self) -> Vec<CheckResult> {
        let topology = &self.config.topology;
        stream::iter(topology.services())
            .map(|s| self.check_service(s))
            .buffer_unordered(MAX_PARALLELISM)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// A service is running when at least one of its processes reports
    /// running. A service without processes is never running.
    pub async fn is_service_running(&self, service: &Service) -> bool {
        self.check_service(service)
            .await
            .iter()
            .any(|result| result.is_running)
    }

    fn find_service(&self, name: &str) -> Result<&Service, LifecycleError> {
        self.config
            .topology
            .find(name)
            .ok_or_else(|| LifecycleError::ServiceNotFound(name.to_string()))
    }
}

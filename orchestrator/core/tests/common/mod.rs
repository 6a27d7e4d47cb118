// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared fixtures for integration tests.
//!
//! [`FakeFleet`] is an in-memory [`CommandRunner`] that simulates process
//! state. Commands take the form `<verb> <service>/<process>` where the verb
//! is `start`, `stop` or `status`.

#![allow(dead_code)]

use async_trait::async_trait;
use big_brother_core::application::tree_walker::ServiceAction;
use big_brother_core::domain::fleet::{FleetConfig, Process, Service, ServiceSpec};
use big_brother_core::domain::graph::Topology;
use big_brother_core::domain::lifecycle::LifecycleError;
use big_brother_core::domain::runner::{CommandRunner, RunnerError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn process(service: &str, name: &str) -> Process {
    let key = format!("{service}/{name}");
    Process {
        name: name.to_string(),
        host: format!("{service}-host"),
        start_cmd: format!("start {key}"),
        stop_cmd: format!("stop {key}"),
        status_cmd: format!("status {key}"),
    }
}

pub fn service(name: &str, depends_on: &str) -> ServiceSpec {
    ServiceSpec::new(name)
        .depends_on(depends_on)
        .with_process(process(name, "main"))
}

/// `db <- api <- web`
pub fn chain() -> Topology {
    Topology::build(vec![
        service("db", ""),
        service("api", "db"),
        service("web", "api"),
    ])
    .unwrap()
}

/// Two trees: `a <- {b <- d, c}` and a lone root `x`.
pub fn forest() -> Topology {
    Topology::build(vec![
        service("a", ""),
        service("b", "a"),
        service("c", "a"),
        service("d", "b"),
        service("x", ""),
    ])
    .unwrap()
}

pub fn fleet_config(topology: Topology) -> Arc<FleetConfig> {
    Arc::new(FleetConfig::new(Duration::ZERO, topology))
}

#[derive(Default)]
pub struct FakeFleet {
    running: Mutex<HashMap<String, bool>>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    stuck: Mutex<HashSet<String>>,
    broken_probes: Mutex<HashSet<String>>,
    status_delay: Mutex<Duration>,
    status_in_flight: AtomicUsize,
    max_status_in_flight: AtomicUsize,
}

impl FakeFleet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_running(&self, key: &str, running: bool) {
        self.running.lock().unwrap().insert(key.to_string(), running);
    }

    pub fn is_running(&self, key: &str) -> bool {
        self.running.lock().unwrap().get(key).copied().unwrap_or(false)
    }

    /// Start and stop commands for `key` exit non-zero.
    pub fn fail_commands(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    /// Start and stop commands for `key` succeed without changing state.
    pub fn make_stuck(&self, key: &str) {
        self.stuck.lock().unwrap().insert(key.to_string());
    }

    /// The status command for `key` cannot be spawned.
    pub fn break_probe(&self, key: &str) {
        self.broken_probes.lock().unwrap().insert(key.to_string());
    }

    /// Every status command takes `delay` to answer.
    pub fn slow_status_commands(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = delay;
    }

    pub fn max_status_in_flight(&self) -> usize {
        self.max_status_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Keys targeted by `verb`, in issue order.
    pub fn issued(&self, verb: &str) -> Vec<String> {
        let prefix = format!("{verb} ");
        self.calls()
            .into_iter()
            .filter_map(|call| call.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for FakeFleet {
    async fn execute(&self, command: &str, host: &str) -> Result<String, RunnerError> {
        self.calls.lock().unwrap().push(command.to_string());

        let Some((verb, key)) = command.split_once(' ') else {
            return Err(RunnerError::EmptyCommand {
                host: host.to_string(),
            });
        };

        match verb {
            "start" | "stop" => {
                if self.failing.lock().unwrap().contains(key) {
                    return Err(RunnerError::NonZeroExit {
                        command: command.to_string(),
                        host: host.to_string(),
                        code: Some(1),
                        output: "permission denied".to_string(),
                    });
                }
                if !self.stuck.lock().unwrap().contains(key) {
                    self.set_running(key, verb == "start");
                }
                Ok(format!("{verb} ok\n"))
            }
            "status" => {
                let delay = *self.status_delay.lock().unwrap();
                if !delay.is_zero() {
                    let now = self.status_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    self.max_status_in_flight.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;
                    self.status_in_flight.fetch_sub(1, Ordering::SeqCst);
                }
                if self.broken_probes.lock().unwrap().contains(key) {
                    return Err(RunnerError::SpawnFailed {
                        command: command.to_string(),
                        host: host.to_string(),
                        message: "connection refused".to_string(),
                    });
                }
                if self.is_running(key) {
                    Ok(format!("{key} is running\n"))
                } else {
                    Err(RunnerError::NonZeroExit {
                        command: command.to_string(),
                        host: host.to_string(),
                        code: Some(3),
                        output: "inactive\n".to_string(),
                    })
                }
            }
            other => Err(RunnerError::SpawnFailed {
                command: command.to_string(),
                host: host.to_string(),
                message: format!("unknown verb {other}"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Begin(String),
    End(String),
}

/// Records when each service's action begins and ends.
#[derive(Default)]
pub struct RecordingAction {
    events: Mutex<Vec<Event>>,
    fail_on: HashSet<String>,
    fail_at_once: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_on(mut self, service: &str) -> Self {
        self.fail_on.insert(service.to_string());
        self
    }

    /// `service` fails as soon as it begins, without the delay.
    pub fn failing_at_once_on(mut self, service: &str) -> Self {
        self.fail_at_once.insert(service.to_string());
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Services whose action began, in order.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Begin(name) => Some(name),
                Event::End(_) => None,
            })
            .collect()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceAction for RecordingAction {
    async fn apply(&self, service: &Service) -> Result<(), LifecycleError> {
        self.events
            .lock()
            .unwrap()
            .push(Event::Begin(service.name.clone()));
        if self.fail_at_once.contains(&service.name) {
            return Err(LifecycleError::StartFailed {
                service: service.name.clone(),
                process: "main".to_string(),
                host: format!("{}-host", service.name),
            });
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events
            .lock()
            .unwrap()
            .push(Event::End(service.name.clone()));

        if self.fail_on.contains(&service.name) {
            return Err(LifecycleError::StartFailed {
                service: service.name.clone(),
                process: "main".to_string(),
                host: format!("{}-host", service.name),
            });
        }
        Ok(())
    }
}

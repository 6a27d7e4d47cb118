// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the lifecycle controller and status reporter,
//! driven by the in-memory fleet.

mod common;

use big_brother_core::application::lifecycle::LifecycleController;
use big_brother_core::application::tree_walker::{WalkMode, MAX_PARALLELISM};
use big_brother_core::domain::fleet::{FleetConfig, ServiceSpec};
use big_brother_core::domain::graph::Topology;
use big_brother_core::domain::lifecycle::{LifecycleError, Phase};
use big_brother_core::domain::runner::RunnerError;
use common::{chain, fleet_config, forest, process, FakeFleet};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn controller(topology: Topology, fleet: &Arc<FakeFleet>, mode: WalkMode) -> LifecycleController {
    LifecycleController::new(fleet_config(topology), fleet.clone(), mode)
}

#[tokio::test]
async fn test_start_all_then_stop_all() {
    let fleet = FakeFleet::new();
    let ctl = controller(chain(), &fleet, WalkMode::Sequential);

    let outcome = ctl.start_all().await;
    assert!(outcome.is_success());
    assert_eq!(fleet.issued("start"), vec!["db/main", "api/main", "web/main"]);
    assert!(ctl.status().check_all().await.iter().all(|r| r.is_running));

    let outcome = ctl.stop_all().await;
    assert!(outcome.is_success());
    assert_eq!(fleet.issued("stop"), vec!["web/main", "api/main", "db/main"]);
    assert!(ctl.status().check_all().await.iter().all(|r| !r.is_running));
}

#[tokio::test]
async fn test_every_transition_is_verified() {
    let fleet = FakeFleet::new();
    let ctl = controller(chain(), &fleet, WalkMode::Sequential);

    ctl.start_service("db", false).await.unwrap();

    assert_eq!(fleet.calls(), vec!["start db/main", "status db/main"]);
}

#[tokio::test]
async fn test_parallel_start_all_reaches_every_service() {
    let fleet = FakeFleet::new();
    let ctl = controller(forest(), &fleet, WalkMode::Parallel(4));

    let outcome = ctl.start_all().await;

    assert!(outcome.is_success());
    for key in ["a/main", "b/main", "c/main", "d/main", "x/main"] {
        assert!(fleet.is_running(key), "{key} should be running");
    }
    let started = fleet.issued("start");
    let pos = |k: &str| started.iter().position(|s| s == k).unwrap();
    assert!(pos("a/main") < pos("b/main"));
    assert!(pos("b/main") < pos("d/main"));
    assert!(pos("a/main") < pos("c/main"));
}

#[tokio::test]
async fn test_start_service_requires_running_dependency() {
    let fleet = FakeFleet::new();
    let ctl = controller(chain(), &fleet, WalkMode::Sequential);

    let err = ctl.start_service("api", false).await.unwrap_err();

    assert_eq!(
        err,
        LifecycleError::DependencyNotRunning {
            dependency: "db".into(),
            service: "api".into(),
        }
    );
    assert!(fleet.issued("start").is_empty());
}

#[tokio::test]
async fn test_start_service_with_running_dependency() {
    let fleet = FakeFleet::new();
    fleet.set_running("db/main", true);
    let ctl = controller(chain(), &fleet, WalkMode::Sequential);

    ctl.start_service("api", false).await.unwrap();

    assert!(fleet.is_running("api/main"));
}

#[tokio::test]
async fn test_ignore_check_skips_dependency_gate() {
    let fleet = FakeFleet::new();
    let ctl = controller(chain(), &fleet, WalkMode::Sequential);

    ctl.start_service("api", true).await.unwrap();

    assert!(fleet.is_running("api/main"));
    assert!(!fleet.is_running("db/main"));
    assert!(fleet.issued("status").iter().all(|k| k == "api/main"));
}

#[tokio::test]
async fn test_unverified_start_aborts_remaining_processes() {
    let topology = Topology::build(vec![ServiceSpec::new("api")
        .with_process(process("api", "worker"))
        .with_process(process("api", "scheduler"))])
    .unwrap();
    let fleet = FakeFleet::new();
    fleet.make_stuck("api/worker");
    let ctl = controller(topology, &fleet, WalkMode::Sequential);

    let err = ctl.start_service("api", false).await.unwrap_err();

    assert_eq!(
        err,
        LifecycleError::StartFailed {
            service: "api".into(),
            process: "worker".into(),
            host: "api-host".into(),
        }
    );
    assert_eq!(fleet.issued("start"), vec!["api/worker"]);
}

#[tokio::test]
async fn test_unverified_stop_is_reported() {
    let fleet = FakeFleet::new();
    fleet.set_running("web/main", true);
    fleet.make_stuck("web/main");
    let ctl = controller(chain(), &fleet, WalkMode::Sequential);

    let err = ctl.stop_service("web").await.unwrap_err();

    assert!(matches!(err, LifecycleError::StopFailed { ref service, .. } if service == "web"));
}

#[tokio::test]
async fn test_command_failure_carries_context() {
    let fleet = FakeFleet::new();
    fleet.fail_commands("db/main");
    let ctl = controller(chain(), &fleet, WalkMode::Sequential);

    let outcome = ctl.start_all().await;

    let err = outcome.into_result().unwrap_err();
    match err {
        LifecycleError::Command {
            service,
            process,
            host,
            phase,
            source,
        } => {
            assert_eq!(service, "db");
            assert_eq!(process, "main");
            assert_eq!(host, "db-host");
            assert_eq!(phase, Phase::Start);
            assert!(matches!(source, RunnerError::NonZeroExit { code: Some(1), .. }));
        }
        other => panic!("expected command error, got {other:?}"),
    }
    assert_eq!(fleet.issued("start"), vec!["db/main"]);
}

#[tokio::test]
async fn test_start_all_failure_leaves_dependents_untouched() {
    let fleet = FakeFleet::new();
    fleet.make_stuck("api/main");
    let ctl = controller(chain(), &fleet, WalkMode::Parallel(4));

    let outcome = ctl.start_all().await;

    let topology = &ctl.config().topology;
    let (failed, _) = outcome.failure.clone().unwrap();
    assert_eq!(topology.service(failed).name, "api");
    assert_eq!(topology.names(&outcome.completed), vec!["db"]);
    assert!(!fleet.issued("start").contains(&"web/main".to_string()));
}

#[tokio::test]
async fn test_stop_service_ignores_dependents() {
    let fleet = FakeFleet::new();
    for key in ["db/main", "api/main", "web/main"] {
        fleet.set_running(key, true);
    }
    let ctl = controller(chain(), &fleet, WalkMode::Sequential);

    ctl.stop_service("db").await.unwrap();

    assert!(!fleet.is_running("db/main"));
    assert!(fleet.is_running("api/main"));
}

#[tokio::test]
async fn test_process_operations_issue_without_verifying() {
    let fleet = FakeFleet::new();
    let ctl = controller(chain(), &fleet, WalkMode::Sequential);

    ctl.start_process("web", "main").await.unwrap();
    ctl.stop_process("web", "main").await.unwrap();

    assert_eq!(fleet.calls(), vec!["start web/main", "stop web/main"]);
}

#[tokio::test]
async fn test_process_operation_surfaces_command_error() {
    let fleet = FakeFleet::new();
    fleet.fail_commands("web/main");
    let ctl = controller(chain(), &fleet, WalkMode::Sequential);

    let err = ctl.stop_process("web", "main").await.unwrap_err();

    assert!(matches!(err, LifecycleError::Command { phase: Phase::Stop, .. }));
}

#[tokio::test]
async fn test_unknown_names() {
    let fleet = FakeFleet::new();
    let ctl = controller(chain(), &fleet, WalkMode::Sequential);

    assert_eq!(
        ctl.start_service("cache", false).await,
        Err(LifecycleError::ServiceNotFound("cache".into()))
    );
    assert_eq!(
        ctl.stop_process("api", "cron").await,
        Err(LifecycleError::ProcessNotFound {
            service: "api".into(),
            process: "cron".into(),
        })
    );
    assert!(matches!(
        ctl.status().check_process("api", "cron").await,
        Err(LifecycleError::ProcessNotFound { .. })
    ));
    assert!(matches!(
        ctl.status().check_service_by_name("cache").await,
        Err(LifecycleError::ServiceNotFound(_))
    ));
    assert!(fleet.calls().is_empty());
}

#[tokio::test]
async fn test_check_is_read_only_and_idempotent() {
    let fleet = FakeFleet::new();
    fleet.set_running("api/main", true);
    let ctl = controller(chain(), &fleet, WalkMode::Sequential);

    let mut first = ctl.status().check_all().await;
    let mut second = ctl.status().check_all().await;
    first.sort_by(|a, b| a.service_name.cmp(&b.service_name));
    second.sort_by(|a, b| a.service_name.cmp(&b.service_name));

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert!(fleet.issued("start").is_empty());
    assert!(fleet.issued("stop").is_empty());

    let api = first.iter().find(|r| r.service_name == "api").unwrap();
    assert!(api.is_running);
    assert_eq!(api.host_name, "api-host");
}

#[tokio::test]
async fn test_broken_probe_reads_as_not_running() {
    let fleet = FakeFleet::new();
    fleet.set_running("db/main", true);
    fleet.break_probe("db/main");
    let ctl = controller(chain(), &fleet, WalkMode::Sequential);

    let results = ctl.status().check_service_by_name("db").await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results[0].is_running);

    let err = ctl.status().check_process("db", "main").await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Command {
            phase: Phase::Status,
            source: RunnerError::SpawnFailed { .. },
            ..
        }
    ));

    // The gate treats an unprobeable dependency as down.
    assert!(matches!(
        ctl.start_service("api", false).await,
        Err(LifecycleError::DependencyNotRunning { .. })
    ));
}

#[tokio::test]
async fn test_settle_delay_precedes_verification() {
    let topology = chain();
    let config = Arc::new(FleetConfig::new(Duration::from_millis(50), topology));
    let fleet = FakeFleet::new();
    let ctl = LifecycleController::new(config, fleet.clone(), WalkMode::Sequential);

    let started = Instant::now();
    ctl.start_service("db", false).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(50));
}

fn db_with_replica() -> Topology {
    Topology::build(vec![
        ServiceSpec::new("db")
            .with_process(process("db", "primary"))
            .with_process(process("db", "replica")),
        common::service("api", "db"),
    ])
    .unwrap()
}

#[tokio::test]
async fn test_gate_accepts_partly_running_dependency() {
    let fleet = FakeFleet::new();
    fleet.set_running("db/primary", true);
    let ctl = controller(db_with_replica(), &fleet, WalkMode::Sequential);

    ctl.start_service("api", false).await.unwrap();

    assert!(fleet.is_running("api/main"));
    assert!(!fleet.is_running("db/replica"));
}

#[tokio::test]
async fn test_gate_refuses_fully_stopped_dependency() {
    let fleet = FakeFleet::new();
    let ctl = controller(db_with_replica(), &fleet, WalkMode::Sequential);

    assert_eq!(
        ctl.start_service("api", false).await,
        Err(LifecycleError::DependencyNotRunning {
            dependency: "db".into(),
            service: "api".into(),
        })
    );
}

#[tokio::test]
async fn test_gate_refuses_dependency_without_processes() {
    let topology = Topology::build(vec![
        ServiceSpec::new("db"),
        common::service("api", "db"),
    ])
    .unwrap();
    let fleet = FakeFleet::new();
    let ctl = controller(topology, &fleet, WalkMode::Sequential);

    assert!(matches!(
        ctl.start_service("api", false).await,
        Err(LifecycleError::DependencyNotRunning { .. })
    ));
    assert!(fleet.issued("start").is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_check_all_bounds_concurrent_status_commands() {
    let specs = (0..250)
        .map(|i| common::service(&format!("svc-{i}"), ""))
        .collect();
    let topology = Topology::build(specs).unwrap();
    let fleet = FakeFleet::new();
    fleet.slow_status_commands(Duration::from_millis(20));
    let ctl = controller(topology, &fleet, WalkMode::Sequential);

    let results = ctl.status().check_all().await;

    assert_eq!(results.len(), 250);
    assert!(fleet.max_status_in_flight() <= MAX_PARALLELISM);
    assert!(fleet.max_status_in_flight() > 1);
}

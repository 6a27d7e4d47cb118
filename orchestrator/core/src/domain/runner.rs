// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command Runner contract
//!
//! Issues a command string against a named host. The only implementation
//! today is [`LocalCommandRunner`](crate::infrastructure::local_runner::LocalCommandRunner),
//! which ignores the host and runs everything on the local machine. Remote
//! dispatch plugs in behind the same trait.
//!
//! # Status Classification
//!
//! A process is running iff its status command exits successfully and the
//! captured output contains one of the [`RUNNING_MARKERS`] as a whole word
//! (case-insensitive). `inactive` therefore does not count, and a non-zero
//! exit from a status command means "not running", not a probe failure.
//! Earlier releases matched markers as substrings, which counted `inactive`
//! as running; whole-word matching deliberately changes that.

use async_trait::async_trait;
use std::time::Duration;

/// Words in status output that mark a process as running.
pub const RUNNING_MARKERS: [&str; 2] = ["running", "active"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunnerError {
    #[error("empty command for host '{host}'")]
    EmptyCommand { host: String },

    #[error("failed to execute '{command}' on host '{host}': {message}")]
    SpawnFailed {
        command: String,
        host: String,
        message: String,
    },

    #[error("command '{command}' on host '{host}' {}, output: {output}", exit_label(.code))]
    NonZeroExit {
        command: String,
        host: String,
        code: Option<i32>,
        output: String,
    },

    #[error("command '{command}' on host '{host}' timed out after {timeout:?}")]
    TimedOut {
        command: String,
        host: String,
        timeout: Duration,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

/// Executes a command on a host and returns its combined stdout and stderr.
///
/// Execution is complete when the future resolves. A non-zero exit is
/// reported as [`RunnerError::NonZeroExit`] carrying the combined output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(&self, command: &str, host: &str) -> Result<String, RunnerError>;
}

/// Whether status output carries a running marker.
pub fn output_indicates_running(output: &str) -> bool {
    output
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .any(|word| {
            RUNNING_MARKERS
                .iter()
                .any(|marker| word.eq_ignore_ascii_case(marker))
        })
}

/// Classify the result of a status command.
///
/// Errors other than a non-zero exit (spawn failure, timeout, empty command)
/// mean the probe itself failed and are returned unchanged.
pub fn classify_status(result: Result<String, RunnerError>) -> Result<bool, RunnerError> {
    match result {
        Ok(output) => Ok(output_indicates_running(&output)),
        Err(RunnerError::NonZeroExit { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

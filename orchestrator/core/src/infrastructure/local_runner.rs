// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local command runner.
//!
//! Runs every command on this machine regardless of the target host. The
//! command string is split on whitespace into a program and its arguments;
//! no shell is involved.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::domain::runner::{CommandRunner, RunnerError};

#[derive(Debug, Clone, Default)]
pub struct LocalCommandRunner {
    timeout: Option<Duration>,
}

impl LocalCommandRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for LocalCommandRunner {
    async fn execute(&self, command: &str, host: &str) -> Result<String, RunnerError> {
        let mut parts = command.split_whitespace();
        let Some(program) = parts.next() else {
            return Err(RunnerError::EmptyCommand {
                host: host.to_string(),
            });
        };

        let mut cmd = Command::new(program);
        cmd.args(parts)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(command, host, "Executing command locally");

        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, cmd.output())
                .await
                .map_err(|_| RunnerError::TimedOut {
                    command: command.to_string(),
                    host: host.to_string(),
                    timeout,
                })?,
            None => cmd.output().await,
        };
        let output = result.map_err(|e| RunnerError::SpawnFailed {
            command: command.to_string(),
            host: host.to_string(),
            message: e.to_string(),
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(RunnerError::NonZeroExit {
                command: command.to_string(),
                host: host.to_string(),
                code: output.status.code(),
                output: combined,
            });
        }
        Ok(combined)
    }
}

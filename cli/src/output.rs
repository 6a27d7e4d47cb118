// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Terminal rendering for check results and the dependency forest.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fmt::Write;

use big_brother_core::domain::fleet::{CheckResult, ServiceId};
use big_brother_core::domain::graph::Topology;

pub const SERVICE_WIDTH: usize = 35;
pub const PROCESS_WIDTH: usize = 10;
pub const HOST_WIDTH: usize = 25;
pub const STATUS_WIDTH: usize = 10;

const ELLIPSIS: &str = "...";

/// Shorten `value` to `width` characters, marking the cut with `...`.
pub fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let keep = width.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = value.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Sort by service, then process, then status label.
pub fn sort_results(results: &mut [CheckResult]) {
    results.sort_by(|a, b| {
        a.service_name
            .cmp(&b.service_name)
            .then_with(|| a.process_name.cmp(&b.process_name))
            .then_with(|| a.status_label().cmp(b.status_label()))
    });
}

pub fn render_table(mut results: Vec<CheckResult>) -> String {
    sort_results(&mut results);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<sw$} {:<pw$} {:<hw$} {}",
        "Service",
        "Process",
        "Host",
        "Status",
        sw = SERVICE_WIDTH,
        pw = PROCESS_WIDTH,
        hw = HOST_WIDTH,
    );
    let _ = writeln!(
        out,
        "{}",
        "-".repeat(SERVICE_WIDTH + PROCESS_WIDTH + HOST_WIDTH + STATUS_WIDTH + 3)
    );

    for result in &results {
        let status = if result.is_running {
            result.status_label().green()
        } else {
            result.status_label().red()
        };
        let _ = writeln!(
            out,
            "{:<sw$} {:<pw$} {:<hw$} {}",
            truncate(&result.service_name, SERVICE_WIDTH),
            truncate(&result.process_name, PROCESS_WIDTH),
            truncate(&result.host_name, HOST_WIDTH),
            status,
            sw = SERVICE_WIDTH,
            pw = PROCESS_WIDTH,
            hw = HOST_WIDTH,
        );
    }
    out
}

pub fn render_json(results: &[CheckResult]) -> Result<String> {
    serde_json::to_string_pretty(results).context("Failed to serialize check results")
}

/// Box-drawing view of the forest, roots first, dependents nested below.
pub fn render_tree(topology: &Topology) -> String {
    fn branch(topology: &Topology, ids: &[ServiceId], prefix: &str, out: &mut String) {
        for (i, &id) in ids.iter().enumerate() {
            let last = i + 1 == ids.len();
            let service = topology.service(id);
            let _ = writeln!(
                out,
                "{prefix}{} {}",
                if last { "└──" } else { "├──" },
                service.name
            );
            let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            branch(topology, service.dependents(), &child_prefix, out);
        }
    }

    let mut out = String::new();
    branch(topology, topology.roots(), "", &mut out);
    out
}

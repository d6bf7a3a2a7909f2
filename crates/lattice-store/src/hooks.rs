// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort post-write hook execution (spec.md §4.4 step 8, §7:
//! "Best-effort post-actions ... log but never propagate").
//!
//! Hooks run strictly after locks are released. Each configured command is
//! spawned through `sh -c`, with the triggering event passed both as JSON
//! on stdin and as environment variables for shells that would rather not
//! parse JSON. A failing or missing hook command is logged at `warn` and
//! never turned into a [`lattice_core::LatticeError`].

use lattice_core::config::HooksConfig;
use lattice_core::Event;
use std::io::Write;
use std::process::{Command, Stdio};

/// Run every `on_event` hook, and every `on_status_change` hook when
/// `event` is a `status_changed` event, passing `event` to each.
pub fn run_post_write_hooks(hooks: Option<&HooksConfig>, event: &Event) {
    let Some(hooks) = hooks else { return };
    for command in hooks.on_event.iter().flatten() {
        run_hook(command, event);
    }
    if event.event_type == lattice_core::event::event_type::STATUS_CHANGED {
        for command in hooks.on_status_change.iter().flatten() {
            run_hook(command, event);
        }
    }
}

fn run_hook(command: &str, event: &Event) {
    let payload = match event.to_jsonl_line() {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!(command, error = %e, "failed to serialize event for hook, skipping");
            return;
        }
    };

    let mut child = match Command::new("sh")
        .arg("-c")
        .arg(command)
        .env("LATTICE_EVENT_TYPE", &event.event_type)
        .env("LATTICE_EVENT_ID", event.id.as_str())
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!(command, error = %e, "hook command failed to spawn");
            return;
        }
    };

    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(payload.as_bytes());
    }

    match child.wait_with_output() {
        Ok(output) if output.status.success() => {
            tracing::debug!(command, "hook command succeeded");
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(command, %stderr, "hook command exited with non-zero status");
        }
        Err(e) => {
            tracing::warn!(command, error = %e, "failed to wait on hook command");
        }
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The central task-write pipeline (spec.md §4.4): lock, gate, append,
//! snapshot, release. Event-first ordering is mandatory — the event log is
//! appended before the snapshot is rewritten, so a crash between the two is
//! recoverable by [`crate::rebuild::rebuild_task`].

use crate::convert::{apply_err, lock_err};
use crate::locks::keys_for_task_write;
use lattice_core::event::event_type as et;
use lattice_core::{evaluate_completion_policy, Event, LatticeError, LatticeResult, TaskId, TaskSnapshot, WorkflowConfig};
use lattice_fs::{atomic_write_str, append_json_line, LatticeLayout};
use lattice_materialize::apply;
use std::time::Duration;

/// Append `events` to `task_id`'s log (and the lifecycle log, where
/// applicable), gate any `status_changed` event against `workflow`'s
/// completion policies, and rewrite the snapshot — all under the canonical
/// sorted lock set.
///
/// `prior_snapshot` is the task's state before this transaction (`None`
/// only for a batch starting with `task_created`). Returns the fully
/// materialized snapshot after every event in the batch has been folded in.
pub fn write_task_events(
    layout: &LatticeLayout,
    task_id: &TaskId,
    prior_snapshot: Option<TaskSnapshot>,
    events: &[Event],
    workflow: &WorkflowConfig,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    let keys = keys_for_task_write(task_id.as_str(), events);
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let _guard = lattice_lock::acquire_many(&layout.locks_dir(), &key_refs, lock_timeout).map_err(lock_err)?;

    let mut snap = prior_snapshot;
    for event in events {
        if event.event_type == et::STATUS_CHANGED {
            gate_status_change(snap.as_ref(), event, workflow)?;
        }
        snap = Some(apply(snap, event).map_err(apply_err)?);
    }
    let Some(snap) = snap else {
        return Err(LatticeError::Validation("empty event batch produced no snapshot".to_string()));
    };

    let events_path = layout.task_events_path(task_id);
    for event in events {
        append_json_line(&events_path, event).map_err(crate::convert::fs_err)?;
        if lattice_core::event::is_lifecycle_event(&event.event_type) {
            append_json_line(&layout.lifecycle_path(), event).map_err(crate::convert::fs_err)?;
        }
    }

    let snapshot_text = snap.to_canonical_json().map_err(LatticeError::from)?;
    atomic_write_str(&layout.task_snapshot_path(task_id), &snapshot_text).map_err(crate::convert::fs_err)?;

    Ok(snap)
}

/// A `status_changed` is force-overridden when `data.force == true` and
/// `data.reason` is a non-empty string (spec.md §4.7); force bypasses both
/// transition validation (checked by the caller before building the event)
/// and completion-policy gating (checked here).
fn is_forced(event: &Event) -> bool {
    let forced = event.data.get("force").and_then(|v| v.as_bool()).unwrap_or(false);
    let has_reason = event.data.get("reason").and_then(|v| v.as_str()).is_some_and(|s| !s.is_empty());
    forced && has_reason
}

fn gate_status_change(prior: Option<&TaskSnapshot>, event: &Event, workflow: &WorkflowConfig) -> LatticeResult<()> {
    if is_forced(event) {
        return Ok(());
    }
    let Some(prior) = prior else { return Ok(()) };
    let Some(to) = event.data.get("to").and_then(|v| v.as_str()) else {
        return Err(LatticeError::Validation("status_changed event missing 'to'".to_string()));
    };
    let check = evaluate_completion_policy(workflow, prior, to);
    if !check.ok {
        return Err(LatticeError::CompletionBlocked(check.failures.join("; ")));
    }
    Ok(())
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;

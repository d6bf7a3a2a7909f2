// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic rebuild from event logs (spec.md §4.9): `rebuild_task`
//! replays one task's log through [`lattice_materialize::apply`] starting
//! from `None`; `rebuild_all` rebuilds every task, then regenerates the
//! global lifecycle log and `ids.json` from the rebuilt snapshots.

use crate::convert::{apply_err, fs_err, lock_err};
use crate::ids::{self, IdsIndex};
use crate::locks::{events_key, tasks_key, LIFECYCLE_KEY};
use crate::scan;
use lattice_core::event::is_lifecycle_event;
use lattice_core::{Event, LatticeError, LatticeResult, ResourceSnapshot, TaskId, TaskSnapshot};
use lattice_fs::{atomic_write_str, read_jsonl_tolerant, LatticeLayout};
use lattice_materialize::{apply, apply_resource};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Default, Serialize)]
pub struct RebuildAllSummary {
    pub tasks_rebuilt: usize,
    pub resources_rebuilt: usize,
    pub lifecycle_events: usize,
}

/// Rebuild a single task's snapshot from its event log, under the task's
/// own lock. Works for both active and archived tasks.
pub fn rebuild_task(layout: &LatticeLayout, task_id: &TaskId, lock_timeout: Duration) -> LatticeResult<TaskSnapshot> {
    let keys = [events_key(task_id.as_str()), tasks_key(task_id.as_str())];
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let _guard = lattice_lock::acquire_many(&layout.locks_dir(), &key_refs, lock_timeout).map_err(lock_err)?;

    let archived = !layout.task_events_path(task_id).exists() && layout.archive_task_events_path(task_id).exists();
    let events_path = if archived { layout.archive_task_events_path(task_id) } else { layout.task_events_path(task_id) };
    let snapshot_path = if archived { layout.archive_task_snapshot_path(task_id) } else { layout.task_snapshot_path(task_id) };

    let read = read_jsonl_tolerant::<Event>(&events_path).map_err(fs_err)?;
    if read.truncated_tail {
        tracing::warn!(task_id = %task_id, "truncated final event line ignored during rebuild");
    }

    let mut snap: Option<TaskSnapshot> = None;
    for event in &read.records {
        snap = Some(apply(snap, event).map_err(apply_err)?);
    }
    let Some(snap) = snap else {
        return Err(LatticeError::NotFound { kind: "task", id: task_id.to_string() });
    };

    let text = snap.to_canonical_json().map_err(LatticeError::from)?;
    atomic_write_str(&snapshot_path, &text).map_err(fs_err)?;
    Ok(snap)
}

fn rebuild_resource(layout: &LatticeLayout, name: &str, lock_timeout: Duration) -> LatticeResult<ResourceSnapshot> {
    let _guard = lattice_lock::acquire(&layout.locks_dir(), &crate::locks::resources_key(name), lock_timeout).map_err(lock_err)?;
    let Some(snapshot) = crate::resources::status(layout, name, chrono::Utc::now())? else {
        return Err(LatticeError::NotFound { kind: "resource", id: name.to_string() });
    };
    let resource_id = lattice_core::ResourceId::new(snapshot.id.clone());
    let events_path = layout.resource_events_path(&resource_id);
    let read = read_jsonl_tolerant::<Event>(&events_path).map_err(fs_err)?;
    if read.truncated_tail {
        tracing::warn!(resource = name, "truncated final event line ignored during rebuild");
    }

    let mut snap: Option<ResourceSnapshot> = None;
    for event in &read.records {
        snap = Some(apply_resource(snap, event).map_err(apply_err)?);
    }
    let Some(snap) = snap else {
        return Err(LatticeError::NotFound { kind: "resource", id: name.to_string() });
    };

    let text = snap.to_canonical_json().map_err(LatticeError::from)?;
    atomic_write_str(&layout.resource_snapshot_path(name), &text).map_err(fs_err)?;
    Ok(snap)
}

/// Rebuild every task and resource snapshot, then regenerate the global
/// lifecycle log and `ids.json` from the rebuilt state (spec.md §4.9).
pub fn rebuild_all(layout: &LatticeLayout, lock_timeout: Duration) -> LatticeResult<RebuildAllSummary> {
    let mut summary = RebuildAllSummary::default();
    let mut rebuilt_snapshots = Vec::new();

    for task_id in scan::all_task_ids(layout)? {
        let snap = rebuild_task(layout, &task_id, lock_timeout)?;
        summary.tasks_rebuilt += 1;
        rebuilt_snapshots.push(snap);
    }

    for name in scan::resource_names(layout)? {
        rebuild_resource(layout, &name, lock_timeout)?;
        summary.resources_rebuilt += 1;
    }

    let mut lifecycle_events: Vec<Event> = Vec::new();
    for task_id in scan::all_task_ids(layout)? {
        let archived = !layout.task_events_path(&task_id).exists();
        let path = if archived { layout.archive_task_events_path(&task_id) } else { layout.task_events_path(&task_id) };
        let read = read_jsonl_tolerant::<Event>(&path).map_err(fs_err)?;
        lifecycle_events.extend(read.records.into_iter().filter(|e| is_lifecycle_event(&e.event_type)));
    }
    lifecycle_events.sort_by(|a, b| (a.ts, &a.id).cmp(&(b.ts, &b.id)));
    summary.lifecycle_events = lifecycle_events.len();

    {
        let _guard = lattice_lock::acquire(&layout.locks_dir(), LIFECYCLE_KEY, lock_timeout).map_err(lock_err)?;
        let mut buf = String::new();
        for event in &lifecycle_events {
            buf.push_str(&event.to_jsonl_line().map_err(LatticeError::from)?);
        }
        atomic_write_str(&layout.lifecycle_path(), &buf).map_err(fs_err)?;
    }

    let pairs: Vec<(String, String)> = rebuilt_snapshots
        .iter()
        .filter_map(|s| s.short_id.as_ref().map(|short| (short.clone(), s.id.to_string())))
        .collect();
    let index: IdsIndex = ids::rebuild_from_snapshots(pairs.iter().map(|(s, t)| (s.as_str(), t.as_str())));
    {
        let _guard = lattice_lock::acquire(&layout.locks_dir(), crate::locks::IDS_KEY, lock_timeout).map_err(lock_err)?;
        ids::write_index(layout, &index)?;
    }

    Ok(summary)
}

#[cfg(test)]
#[path = "rebuild_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Archive move for `task_archived` / `task_unarchived` (spec.md §4.4).
//!
//! The event is appended to the per-task log and the lifecycle log under
//! the normal lock set first; only then, still under that lock, are the
//! snapshot, event log and notes file physically relocated. A crash between
//! the event append and the file move leaves the snapshot materializable
//! from the (already-appended) event, so [`crate::rebuild::rebuild_task`]
//! recovers either order.

use crate::convert::{apply_err, fs_err, lock_err};
use crate::locks::keys_for_task_write;
use lattice_core::event::event_type as et;
use lattice_core::{Actor, Event, LatticeError, LatticeResult, TaskId, TaskSnapshot};
use lattice_fs::{append_json_line, atomic_write_str, LatticeLayout};
use lattice_materialize::apply;
use std::time::Duration;

fn move_file(from: &std::path::Path, to: &std::path::Path) -> LatticeResult<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|source| fs_err(lattice_fs::FsError::Io { path: parent.to_path_buf(), source }))?;
    }
    std::fs::rename(from, to).map_err(|source| fs_err(lattice_fs::FsError::Io { path: from.to_path_buf(), source }))
}

/// `task_archived`: move `tasks/<id>.json` to `archive/tasks/`, the event
/// log to `archive/events/`, and the notes file (if present) to
/// `archive/notes/`.
pub fn archive_task(
    layout: &LatticeLayout,
    task_id: &TaskId,
    prior: TaskSnapshot,
    actor: Actor,
    reason: Option<&str>,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    let event = Event::for_task(
        task_id.clone(),
        et::TASK_ARCHIVED,
        now,
        actor,
        serde_json::json!({ "reason": reason }),
    );
    let keys = keys_for_task_write(task_id.as_str(), std::slice::from_ref(&event));
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let _guard = lattice_lock::acquire_many(&layout.locks_dir(), &key_refs, lock_timeout).map_err(lock_err)?;

    if !layout.task_snapshot_path(task_id).exists() {
        return Err(LatticeError::Conflict(format!("task '{task_id}' is already archived")));
    }

    append_json_line(&layout.task_events_path(task_id), &event).map_err(fs_err)?;
    append_json_line(&layout.lifecycle_path(), &event).map_err(fs_err)?;

    let snap = apply(Some(prior), &event).map_err(apply_err)?;
    let text = snap.to_canonical_json().map_err(LatticeError::from)?;
    atomic_write_str(&layout.archive_task_snapshot_path(task_id), &text).map_err(fs_err)?;
    std::fs::remove_file(layout.task_snapshot_path(task_id)).map_err(|source| fs_err(lattice_fs::FsError::Io { path: layout.task_snapshot_path(task_id), source }))?;
    move_file(&layout.task_events_path(task_id), &layout.archive_task_events_path(task_id))?;

    let note_path = layout.note_path(task_id);
    if note_path.exists() {
        move_file(&note_path, &layout.archive_note_path(task_id))?;
    }

    Ok(snap)
}

/// `task_unarchived`: the reverse move.
pub fn unarchive_task(
    layout: &LatticeLayout,
    task_id: &TaskId,
    prior: TaskSnapshot,
    actor: Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    let event = Event::for_task(task_id.clone(), et::TASK_UNARCHIVED, now, actor, serde_json::json!({}));
    let keys = keys_for_task_write(task_id.as_str(), std::slice::from_ref(&event));
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let _guard = lattice_lock::acquire_many(&layout.locks_dir(), &key_refs, lock_timeout).map_err(lock_err)?;

    if !layout.archive_task_snapshot_path(task_id).exists() {
        return Err(LatticeError::Conflict(format!("task '{task_id}' is not archived")));
    }

    append_json_line(&layout.archive_task_events_path(task_id), &event).map_err(fs_err)?;
    append_json_line(&layout.lifecycle_path(), &event).map_err(fs_err)?;

    let snap = apply(Some(prior), &event).map_err(apply_err)?;
    let text = snap.to_canonical_json().map_err(LatticeError::from)?;
    atomic_write_str(&layout.task_snapshot_path(task_id), &text).map_err(fs_err)?;
    std::fs::remove_file(layout.archive_task_snapshot_path(task_id)).map_err(|source| fs_err(lattice_fs::FsError::Io { path: layout.archive_task_snapshot_path(task_id), source }))?;
    move_file(&layout.archive_task_events_path(task_id), &layout.task_events_path(task_id))?;

    let archived_note_path = layout.archive_note_path(task_id);
    if archived_note_path.exists() {
        move_file(&archived_note_path, &layout.note_path(task_id))?;
    }

    Ok(snap)
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical lock key names (spec.md §4.3) and the per-write-path key sets.

use lattice_core::event::is_lifecycle_event;
use lattice_core::Event;

pub fn events_key(task_id: &str) -> String {
    format!("events_{task_id}")
}

pub fn tasks_key(task_id: &str) -> String {
    format!("tasks_{task_id}")
}

pub const LIFECYCLE_KEY: &str = "events__lifecycle";
pub const CONFIG_KEY: &str = "config";
pub const IDS_KEY: &str = "ids";

pub fn resources_key(name: &str) -> String {
    format!("resources_{name}")
}

/// Lock keys required for a task write: always the task's own events/tasks
/// keys, plus the global lifecycle key if any event in the batch is
/// lifecycle-class (spec.md §4.4 step 1). Unsorted; `lattice_lock::acquire_many`
/// sorts.
pub fn keys_for_task_write(task_id: &str, events: &[Event]) -> Vec<String> {
    let mut keys = vec![events_key(task_id), tasks_key(task_id)];
    if events.iter().any(|e| is_lifecycle_event(&e.event_type)) {
        keys.push(LIFECYCLE_KEY.to_string());
    }
    keys
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory enumeration helpers shared by [`crate::rebuild`] and
//! [`crate::integrity`]: listing every known task/resource id on disk
//! without going through any single task's lock (both callers already hold
//! or don't need per-task locks, since they only read).

use crate::convert::fs_err;
use lattice_core::{LatticeResult, TaskId};
use lattice_fs::LatticeLayout;
use std::path::Path;

fn list_ids_in(dir: &Path, strip_suffix: &str) -> LatticeResult<Vec<TaskId>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|source| fs_err(lattice_fs::FsError::Io { path: dir.to_path_buf(), source }))? {
        let entry = entry.map_err(|source| fs_err(lattice_fs::FsError::Io { path: dir.to_path_buf(), source }))?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else { continue };
        let Some(stem) = file_name.strip_suffix(strip_suffix) else { continue };
        if stem.starts_with('_') {
            continue; // _lifecycle.jsonl and similar sentinel files
        }
        ids.push(TaskId::new(stem.to_string()));
    }
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    Ok(ids)
}

/// Every active (non-archived) task id, derived from `tasks/*.json`.
pub fn active_task_ids(layout: &LatticeLayout) -> LatticeResult<Vec<TaskId>> {
    list_ids_in(&layout.tasks_dir(), ".json")
}

/// Every archived task id, derived from `archive/tasks/*.json`.
pub fn archived_task_ids(layout: &LatticeLayout) -> LatticeResult<Vec<TaskId>> {
    list_ids_in(&layout.archive_tasks_dir(), ".json")
}

/// Active and archived task ids together.
pub fn all_task_ids(layout: &LatticeLayout) -> LatticeResult<Vec<TaskId>> {
    let mut ids = active_task_ids(layout)?;
    ids.extend(archived_task_ids(layout)?);
    Ok(ids)
}

/// Every resource name, derived from the subdirectories of `resources/`.
pub fn resource_names(layout: &LatticeLayout) -> LatticeResult<Vec<String>> {
    crate::resources::list(layout)
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The on-disk directory layout under `.lattice/` and root discovery
//! (spec.md §4.2).

use crate::error::{FsError, FsResult};
use lattice_core::{ArtifactId, ResourceId, TaskId};
use std::env;
use std::path::{Path, PathBuf};

pub const LATTICE_DIR_NAME: &str = ".lattice";
pub const LATTICE_ROOT_ENV: &str = "LATTICE_ROOT";

/// The resolved layout for a single Lattice project, rooted at `<root>/.lattice`.
#[derive(Debug, Clone)]
pub struct LatticeLayout {
    root: PathBuf,
}

impl LatticeLayout {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self { root: project_root.into() }
    }

    /// Discover the project root by walking upward from `start` looking for
    /// a `.lattice/` directory, capped at the filesystem root.
    ///
    /// `LATTICE_ROOT` overrides discovery entirely: it names the *parent* of
    /// `.lattice/` directly (spec.md §4.2, §6.4).
    pub fn discover(start: &Path) -> Option<Self> {
        if let Ok(root_override) = env::var(LATTICE_ROOT_ENV) {
            return Some(Self::new(PathBuf::from(root_override)));
        }
        let mut current = start.to_path_buf();
        loop {
            if current.join(LATTICE_DIR_NAME).is_dir() {
                return Some(Self::new(current));
            }
            if !current.pop() {
                return None;
            }
        }
    }

    pub fn discover_or_err(start: &Path) -> FsResult<Self> {
        Self::discover(start).ok_or_else(|| FsError::NoLatticeRoot(start.to_path_buf()))
    }

    pub fn project_root(&self) -> &Path {
        &self.root
    }

    pub fn lattice_dir(&self) -> PathBuf {
        self.root.join(LATTICE_DIR_NAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.lattice_dir().join("config.json")
    }

    pub fn context_path(&self) -> PathBuf {
        self.lattice_dir().join("context.md")
    }

    pub fn ids_path(&self) -> PathBuf {
        self.lattice_dir().join("ids.json")
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.lattice_dir().join("tasks")
    }

    pub fn task_snapshot_path(&self, task_id: &TaskId) -> PathBuf {
        self.tasks_dir().join(format!("{task_id}.json"))
    }

    pub fn events_dir(&self) -> PathBuf {
        self.lattice_dir().join("events")
    }

    pub fn task_events_path(&self, task_id: &TaskId) -> PathBuf {
        self.events_dir().join(format!("{task_id}.jsonl"))
    }

    pub fn lifecycle_path(&self) -> PathBuf {
        self.events_dir().join("_lifecycle.jsonl")
    }

    pub fn resource_events_path(&self, resource_id: &ResourceId) -> PathBuf {
        self.events_dir().join(format!("res_{resource_id}.jsonl"))
    }

    pub fn resources_dir(&self) -> PathBuf {
        self.lattice_dir().join("resources")
    }

    /// `resources/<name>/resource.json`; `name` must already be filesystem-safe.
    pub fn resource_snapshot_path(&self, name: &str) -> PathBuf {
        self.resources_dir().join(name).join("resource.json")
    }

    pub fn artifacts_meta_dir(&self) -> PathBuf {
        self.lattice_dir().join("artifacts").join("meta")
    }

    pub fn artifact_meta_path(&self, artifact_id: &ArtifactId) -> PathBuf {
        self.artifacts_meta_dir().join(format!("{artifact_id}.json"))
    }

    pub fn artifacts_payload_dir(&self) -> PathBuf {
        self.lattice_dir().join("artifacts").join("payload")
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.lattice_dir().join("notes")
    }

    pub fn note_path(&self, task_id: &TaskId) -> PathBuf {
        self.notes_dir().join(format!("{task_id}.md"))
    }

    pub fn plans_dir(&self) -> PathBuf {
        self.lattice_dir().join("plans")
    }

    pub fn plan_path(&self, task_id: &TaskId) -> PathBuf {
        self.plans_dir().join(format!("{task_id}.md"))
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.lattice_dir().join("archive")
    }

    pub fn archive_tasks_dir(&self) -> PathBuf {
        self.archive_dir().join("tasks")
    }

    pub fn archive_task_snapshot_path(&self, task_id: &TaskId) -> PathBuf {
        self.archive_tasks_dir().join(format!("{task_id}.json"))
    }

    pub fn archive_events_dir(&self) -> PathBuf {
        self.archive_dir().join("events")
    }

    pub fn archive_task_events_path(&self, task_id: &TaskId) -> PathBuf {
        self.archive_events_dir().join(format!("{task_id}.jsonl"))
    }

    pub fn archive_notes_dir(&self) -> PathBuf {
        self.archive_dir().join("notes")
    }

    pub fn archive_note_path(&self, task_id: &TaskId) -> PathBuf {
        self.archive_notes_dir().join(format!("{task_id}.md"))
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.lattice_dir().join("locks")
    }

    pub fn lock_path(&self, key: &str) -> PathBuf {
        self.locks_dir().join(format!("{key}.lock"))
    }

    pub fn worker_logs_dir(&self) -> PathBuf {
        self.lattice_dir().join("logs").join("workers")
    }

    pub fn worker_log_path(&self, event_id: &str) -> PathBuf {
        self.worker_logs_dir().join(format!("{event_id}.log"))
    }

    /// Create every required directory under `.lattice/` (idempotent).
    pub fn ensure_scaffold(&self) -> FsResult<()> {
        for dir in [
            self.tasks_dir(),
            self.events_dir(),
            self.resources_dir(),
            self.artifacts_meta_dir(),
            self.artifacts_payload_dir(),
            self.notes_dir(),
            self.plans_dir(),
            self.archive_tasks_dir(),
            self.archive_events_dir(),
            self.archive_notes_dir(),
            self.locks_dir(),
            self.worker_logs_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|source| FsError::Io { path: dir, source })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;

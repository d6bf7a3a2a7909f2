// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integrity audit (`doctor`) and fix mode (spec.md §4.9): eleven checks
//! over the full project tree, each producing `{level, check, message,
//! task_id?}` finding records. Read-only except [`fix`], which only trims
//! truncated JSONL tails and rebuilds `ids.json` (full snapshot rebuild is
//! opt-in, since it's a heavier operation the caller may want to gate
//! behind `--fix --rebuild`).

use crate::convert::fs_err;
use crate::ids::IdsIndex;
use crate::scan;
use lattice_core::id::validate_short_id;
use lattice_core::{event::is_lifecycle_event, ArtifactId, Config, Event, EvidenceSourceType, LatticeResult, TaskId, TaskSnapshot};
use lattice_fs::{read_json_opt, strip_truncated_tail, LatticeLayout};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub level: FindingLevel,
    pub check: &'static str,
    pub message: String,
    pub task_id: Option<String>,
}

fn warn(check: &'static str, message: impl Into<String>, task_id: Option<&str>) -> Finding {
    Finding { level: FindingLevel::Warning, check, message: message.into(), task_id: task_id.map(str::to_string) }
}

fn err(check: &'static str, message: impl Into<String>, task_id: Option<&str>) -> Finding {
    Finding { level: FindingLevel::Error, check, message: message.into(), task_id: task_id.map(str::to_string) }
}

struct LoadedTask {
    id: TaskId,
    archived: bool,
    snapshot: Option<TaskSnapshot>,
    events: Vec<Event>,
}

fn load_all_tasks(layout: &LatticeLayout, findings: &mut Vec<Finding>) -> LatticeResult<Vec<LoadedTask>> {
    let mut out = Vec::new();
    for (id, archived) in scan::active_task_ids(layout)?
        .into_iter()
        .map(|id| (id, false))
        .chain(scan::archived_task_ids(layout)?.into_iter().map(|id| (id, true)))
    {
        let snapshot_path = if archived { layout.archive_task_snapshot_path(&id) } else { layout.task_snapshot_path(&id) };
        let events_path = if archived { layout.archive_task_events_path(&id) } else { layout.task_events_path(&id) };

        let snapshot = match read_json_opt::<TaskSnapshot>(&snapshot_path) {
            Ok(snap) => snap,
            Err(e) => {
                findings.push(err("json_parseable", format!("{snapshot_path:?}: {e}"), Some(id.as_str())));
                None
            }
        };

        let (events, truncated_tail) = match lattice_fs::read_jsonl_tolerant::<Event>(&events_path) {
            Ok(read) => (read.records, read.truncated_tail),
            Err(e) => {
                findings.push(err("jsonl_parseable", format!("{events_path:?}: {e}"), Some(id.as_str())));
                (Vec::new(), false)
            }
        };
        if truncated_tail {
            findings.push(warn("jsonl_parseable", format!("{events_path:?}: truncated final line"), Some(id.as_str())));
        }

        out.push(LoadedTask { id, archived, snapshot, events });
    }
    Ok(out)
}

/// Run every audit check and return the findings, most structurally
/// significant first is not guaranteed — callers sort/group by `level` as
/// needed.
pub fn doctor(layout: &LatticeLayout, config: &Config, now: chrono::DateTime<chrono::Utc>) -> LatticeResult<Vec<Finding>> {
    let mut findings = Vec::new();

    // 1 + 2: JSON/JSONL parseability of config, snapshots, events.
    if let Err(e) = read_json_opt::<Config>(&layout.config_path()) {
        findings.push(err("json_parseable", format!("config.json: {e}"), None));
    }
    for artifact_path in list_files(&layout.artifacts_meta_dir()) {
        if let Err(e) = read_json_opt::<serde_json::Value>(&artifact_path) {
            findings.push(err("json_parseable", format!("{artifact_path:?}: {e}"), None));
        }
    }

    let tasks = load_all_tasks(layout, &mut findings)?;
    let known_ids: BTreeSet<&str> = tasks.iter().filter_map(|t| t.snapshot.as_ref()).map(|s| s.id.as_str()).collect();

    for task in &tasks {
        let Some(snap) = &task.snapshot else { continue };

        // 3: snapshot drift (active tasks only).
        if !task.archived {
            if let Some(last) = task.events.last() {
                if snap.last_event_id != last.id {
                    findings.push(err("snapshot_drift", "snapshot.last_event_id does not match the last event in the log", Some(task.id.as_str())));
                }
            }
        }

        // 4 + 6 + 7: relationship targets, self-links, duplicate edges.
        let mut seen_edges = BTreeSet::new();
        for rel in &snap.relationships_out {
            if rel.target_task_id == snap.id {
                findings.push(err("self_link", format!("relationship '{}' points at its own task", rel.rel_type), Some(task.id.as_str())));
            }
            if !known_ids.contains(rel.target_task_id.as_str()) {
                findings.push(err("missing_relationship_target", format!("relationship target '{}' does not exist", rel.target_task_id), Some(task.id.as_str())));
            }
            if !seen_edges.insert((rel.rel_type.clone(), rel.target_task_id.clone())) {
                findings.push(err("duplicate_edge", format!("duplicate '{}' edge to '{}'", rel.rel_type, rel.target_task_id), Some(task.id.as_str())));
            }
        }

        // 5: missing artifacts.
        for evidence in &snap.evidence_refs {
            if evidence.source_type == EvidenceSourceType::Artifact {
                let artifact_id = ArtifactId::new(evidence.id.clone());
                if !layout.artifact_meta_path(&artifact_id).exists() {
                    findings.push(err("missing_artifact", format!("evidence references missing artifact '{}'", evidence.id), Some(task.id.as_str())));
                }
            }
        }

        // 8: malformed IDs.
        if !TaskId::is_well_formed(snap.id.as_str()) {
            findings.push(err("malformed_id", format!("task id '{}' is malformed", snap.id), Some(task.id.as_str())));
        }
        if let Some(short_id) = &snap.short_id {
            if !validate_short_id(short_id) {
                findings.push(err("malformed_id", format!("short id '{short_id}' does not match the expected shape"), Some(task.id.as_str())));
            }
        }
    }

    // 9: lifecycle consistency.
    let mut per_task_lifecycle_ids = BTreeSet::new();
    for task in &tasks {
        for event in &task.events {
            if is_lifecycle_event(&event.event_type) {
                per_task_lifecycle_ids.insert(event.id.clone());
            }
        }
    }
    let lifecycle_log_ids: BTreeSet<_> = lattice_fs::read_jsonl_tolerant::<Event>(&layout.lifecycle_path())
        .map_err(fs_err)?
        .records
        .into_iter()
        .map(|e| e.id)
        .collect();
    if per_task_lifecycle_ids != lifecycle_log_ids {
        findings.push(err(
            "lifecycle_consistency",
            format!(
                "_lifecycle.jsonl has {} event(s) not matching the {} lifecycle event(s) recorded in per-task logs",
                lifecycle_log_ids.symmetric_difference(&per_task_lifecycle_ids).count(),
                per_task_lifecycle_ids.len()
            ),
            None,
        ));
    }

    // 10: short-ID integrity.
    if config.project_code.is_some() {
        match read_json_opt::<IdsIndex>(&layout.ids_path()).map_err(fs_err)? {
            None => findings.push(err("short_id_integrity", "project_code is configured but ids.json is missing", None)),
            Some(index) => check_short_id_integrity(&index, &tasks, &mut findings),
        }
    }

    // 11: resource drift and stale holders.
    for name in scan::resource_names(layout)? {
        let Some(snapshot) = read_json_opt::<lattice_core::ResourceSnapshot>(&layout.resource_snapshot_path(&name)).map_err(fs_err)? else {
            continue;
        };
        let resource_id = lattice_core::ResourceId::new(snapshot.id.clone());
        let read = lattice_fs::read_jsonl_tolerant::<Event>(&layout.resource_events_path(&resource_id)).map_err(fs_err)?;
        if read.truncated_tail {
            findings.push(warn("jsonl_parseable", format!("resource '{name}' event log: truncated final line"), None));
        }
        if let Some(last) = read.records.last() {
            if snapshot.last_event_id != last.id {
                findings.push(err("resource_drift", format!("resource '{name}' snapshot.last_event_id does not match its log"), None));
            }
        }
        for holder in &snapshot.holders {
            if holder.expires_at < now {
                findings.push(warn("stale_holder", format!("resource '{name}' holder '{}' has an expired lease", holder.actor.resume_key()), None));
            }
        }
    }

    Ok(findings)
}

fn check_short_id_integrity(index: &IdsIndex, tasks: &[LoadedTask], findings: &mut Vec<Finding>) {
    let known_tasks: BTreeSet<&str> = tasks.iter().filter_map(|t| t.snapshot.as_ref()).map(|s| s.id.as_str()).collect();

    for (short_id, task_ulid) in &index.map {
        if !known_tasks.contains(task_ulid.as_str()) {
            findings.push(err("short_id_integrity", format!("ids.json maps '{short_id}' to unknown task '{task_ulid}'"), None));
        }
    }

    let mut short_id_owners: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for task in tasks {
        let Some(snap) = &task.snapshot else { continue };
        let Some(short_id) = &snap.short_id else { continue };
        short_id_owners.entry(short_id.as_str()).or_default().push(snap.id.as_str());
        if !index.map.contains_key(short_id.as_str()) {
            findings.push(err("short_id_integrity", format!("task '{}' has short id '{short_id}' absent from ids.json", snap.id), Some(snap.id.as_str())));
        }
    }
    for (short_id, owners) in &short_id_owners {
        if owners.len() > 1 {
            findings.push(err("short_id_integrity", format!("short id '{short_id}' is claimed by {} tasks", owners.len()), None));
        }
    }

    for (short_id, owners) in &short_id_owners {
        let Some((prefix, n)) = lattice_core::id::parse_short_id(short_id) else { continue };
        let _ = owners;
        let next = index.next_seqs.get(&prefix).copied().unwrap_or(0);
        if next <= n {
            findings.push(err("short_id_integrity", format!("next_seqs['{prefix}'] ({next}) is not greater than assigned sequence {n}"), None));
        }
    }
}

fn list_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else { return Vec::new() };
    entries.filter_map(|e| e.ok()).map(|e| e.path()).filter(|p| p.is_file()).collect()
}

#[derive(Debug, Default, Serialize)]
pub struct FixSummary {
    pub truncated_logs_trimmed: usize,
    pub ids_rebuilt: bool,
    pub snapshots_rebuilt: usize,
}

/// Fix mode (spec.md §4.9): trims truncated final JSONL lines from every
/// per-task and resource event log, then rebuilds `ids.json` from the
/// (now-clean) snapshots. Full snapshot rebuild only runs when
/// `rebuild_snapshots` is set, since it's a heavier operation than trimming.
pub fn fix(layout: &LatticeLayout, lock_timeout: Duration, rebuild_snapshots: bool) -> LatticeResult<FixSummary> {
    let mut summary = FixSummary::default();

    for task_id in scan::all_task_ids(layout)? {
        let archived = !layout.task_events_path(&task_id).exists();
        let path = if archived { layout.archive_task_events_path(&task_id) } else { layout.task_events_path(&task_id) };
        let keys = [crate::locks::events_key(task_id.as_str())];
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let _guard = lattice_lock::acquire_many(&layout.locks_dir(), &key_refs, lock_timeout).map_err(crate::convert::lock_err)?;
        if strip_truncated_tail::<Event>(&path).map_err(fs_err)? {
            summary.truncated_logs_trimmed += 1;
        }
    }

    if rebuild_snapshots {
        let rebuild_summary = crate::rebuild::rebuild_all(layout, lock_timeout)?;
        summary.snapshots_rebuilt = rebuild_summary.tasks_rebuilt;
        summary.ids_rebuilt = true;
    } else {
        let tasks = load_all_tasks(layout, &mut Vec::new())?;
        let pairs: Vec<(String, String)> = tasks
            .iter()
            .filter_map(|t| t.snapshot.as_ref())
            .filter_map(|s| s.short_id.as_ref().map(|short| (short.clone(), s.id.to_string())))
            .collect();
        let index = crate::ids::rebuild_from_snapshots(pairs.iter().map(|(s, t)| (s.as_str(), t.as_str())));
        let _guard = lattice_lock::acquire(&layout.locks_dir(), crate::locks::IDS_KEY, lock_timeout).map_err(crate::convert::lock_err)?;
        crate::ids::write_index(layout, &index)?;
        summary.ids_rebuilt = true;
    }

    Ok(summary)
}

#[cfg(test)]
#[path = "integrity_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `apply(snapshot, event) -> snapshot`: the sole task-snapshot mutation
//! path, shared by the write pipeline and the rebuild pipeline (spec.md
//! §4.1).
//!
//! Determinism requirement: every timestamp in the output snapshot derives
//! from `event.ts`; this function never reads the wall clock.

use crate::error::{ApplyError, ApplyResult};
use lattice_core::event::event_type as et;
use lattice_core::{
    ActiveProcess, BranchLink, Event, EvidenceRef, EvidenceSourceType, Relationship, TaskSnapshot,
};
use serde_json::Value;
use tracing::warn;

fn field<'a>(data: &'a Value, name: &'static str, event_type: &str) -> ApplyResult<&'a Value> {
    data.get(name)
        .ok_or_else(|| ApplyError::MissingField(name, event_type.to_string()))
}

fn field_str(data: &Value, name: &'static str, event_type: &str) -> ApplyResult<String> {
    field(data, name, event_type)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ApplyError::MalformedData { field: name, event_type: event_type.to_string(), message: "expected a string".to_string() })
}

fn field_opt_str(data: &Value, name: &'static str) -> Option<String> {
    data.get(name).and_then(|v| v.as_str()).map(str::to_string)
}

/// Apply a single event to `snapshot` (or build a fresh one from
/// `task_created`). Mirrors the Python original's single materialization
/// path (`apply_event_to_snapshot`): one entry point for incremental writes
/// and full rebuild alike.
pub fn apply(snapshot: Option<TaskSnapshot>, event: &Event) -> ApplyResult<TaskSnapshot> {
    let mut snap = if event.event_type == et::TASK_CREATED {
        init_snapshot(event)?
    } else {
        let Some(existing) = snapshot else {
            return Err(ApplyError::NoInitialSnapshot { event_type: event.event_type.clone() });
        };
        let mut snap = existing;
        apply_mutation(&mut snap, event)?;
        snap
    };

    snap.last_event_id = event.id.clone();
    snap.updated_at = event.ts;
    Ok(snap)
}

fn init_snapshot(event: &Event) -> ApplyResult<TaskSnapshot> {
    let data = &event.data;
    let Some(task_id) = event.subject.task_id().cloned() else {
        return Err(ApplyError::MissingField("task_id", event.event_type.clone()));
    };
    let status = field_str(data, "status", &event.event_type)?;
    let done_at = (status == "done").then_some(event.ts);
    let tags = data
        .get("tags")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect());
    let custom_fields = data
        .get("custom_fields")
        .and_then(|v| v.as_object())
        .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();

    Ok(TaskSnapshot {
        schema_version: 1,
        id: task_id,
        title: field_str(data, "title", &event.event_type)?,
        status,
        priority: field_str(data, "priority", &event.event_type)?,
        urgency: field_opt_str(data, "urgency"),
        complexity: field_opt_str(data, "complexity"),
        task_type: field_str(data, "type", &event.event_type)?,
        description: field_opt_str(data, "description"),
        tags,
        assigned_to: data.get("assigned_to").and_then(|v| serde_json::from_value(v.clone()).ok()),
        short_id: field_opt_str(data, "short_id"),
        created_by: event.actor.clone(),
        created_at: event.ts,
        updated_at: event.ts,
        done_at,
        relationships_out: vec![],
        evidence_refs: vec![],
        branch_links: vec![],
        comment_count: 0,
        reopened_count: 0,
        custom_fields,
        active_processes: None,
        last_event_id: event.id.clone(),
    })
}

fn apply_mutation(snap: &mut TaskSnapshot, event: &Event) -> ApplyResult<()> {
    let data = &event.data;
    let etype = event.event_type.as_str();

    match etype {
        et::STATUS_CHANGED => mut_status_changed(snap, event)?,
        et::ASSIGNMENT_CHANGED => {
            snap.assigned_to = field(data, "to", etype)
                .ok()
                .and_then(|v| serde_json::from_value(v.clone()).ok());
        }
        et::FIELD_UPDATED => mut_field_updated(snap, event)?,
        et::RELATIONSHIP_ADDED => mut_relationship_added(snap, event)?,
        et::RELATIONSHIP_REMOVED => mut_relationship_removed(snap, event)?,
        et::ARTIFACT_ATTACHED => mut_artifact_attached(snap, event)?,
        et::TASK_SHORT_ID_ASSIGNED => {
            snap.short_id = Some(field_str(data, "short_id", etype)?);
        }
        et::BRANCH_LINKED => mut_branch_linked(snap, event)?,
        et::BRANCH_UNLINKED => mut_branch_unlinked(snap, event)?,
        et::COMMENT_ADDED => mut_comment_added(snap, event),
        et::COMMENT_EDITED => mut_comment_edited(snap, event),
        et::COMMENT_DELETED => mut_comment_deleted(snap, event),
        et::PROCESS_STARTED => mut_process_started(snap, event)?,
        et::PROCESS_COMPLETED | et::PROCESS_FAILED => mut_process_ended(snap, event),
        // Pure bookkeeping no-ops: reactions and git events carry no
        // snapshot-visible state of their own; archive/unarchive are
        // handled by the storage layer's file move, not by `apply`.
        et::REACTION_ADDED
        | et::REACTION_REMOVED
        | et::GIT_EVENT
        | et::TASK_ARCHIVED
        | et::TASK_UNARCHIVED => {}
        other if lattice_core::event::is_custom_event_type(other) => {}
        other => {
            warn!(event_type = other, "unknown event type ignored during snapshot materialization");
        }
    }
    Ok(())
}

fn mut_status_changed(snap: &mut TaskSnapshot, event: &Event) -> ApplyResult<()> {
    let data = &event.data;
    let from = field_opt_str(data, "from");
    let to = field_str(data, "to", &event.event_type)?;
    if is_backward_in_default_order(from.as_deref(), &to) {
        snap.reopened_count += 1;
    }
    snap.status = to.clone();
    if to == "done" {
        snap.done_at = Some(event.ts);
    } else if snap.done_at.is_some() {
        snap.done_at = None;
    }
    Ok(())
}

/// Mirrors `_DEFAULT_STATUS_ORDER` in the original core module; used only
/// when a project-specific order isn't threaded through (callers holding a
/// `Config` should prefer `WorkflowConfig::is_backward_transition`).
const DEFAULT_STATUS_ORDER: &[&str] = &[
    "backlog",
    "in_planning",
    "planned",
    "in_progress",
    "review",
    "done",
    "blocked",
    "needs_human",
    "cancelled",
];

fn is_backward_in_default_order(from: Option<&str>, to: &str) -> bool {
    let Some(from) = from else { return false };
    let (Some(from_rank), Some(to_rank)) = (
        DEFAULT_STATUS_ORDER.iter().position(|s| *s == from),
        DEFAULT_STATUS_ORDER.iter().position(|s| *s == to),
    ) else {
        return false;
    };
    to_rank < from_rank
}

fn mut_field_updated(snap: &mut TaskSnapshot, event: &Event) -> ApplyResult<()> {
    let data = &event.data;
    let etype = &event.event_type;
    let field_name = field_str(data, "field", etype)?;
    let to = field(data, "to", etype)?.clone();

    if let Some(key) = field_name.strip_prefix("custom_fields.") {
        snap.custom_fields.insert(key.to_string(), to);
        return Ok(());
    }
    if lattice_core::snapshot::is_protected_field(&field_name) {
        return Err(ApplyError::ProtectedField(field_name));
    }
    match field_name.as_str() {
        "title" => snap.title = to.as_str().unwrap_or_default().to_string(),
        "priority" => snap.priority = to.as_str().unwrap_or_default().to_string(),
        "urgency" => snap.urgency = to.as_str().map(str::to_string),
        "complexity" => snap.complexity = to.as_str().map(str::to_string),
        "type" => snap.task_type = to.as_str().unwrap_or_default().to_string(),
        "description" => snap.description = to.as_str().map(str::to_string),
        "tags" => {
            snap.tags = to
                .as_array()
                .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect());
        }
        _ => {
            // Forward-compatible scalar fields not named above: stash under
            // custom_fields rather than silently dropping the write.
            snap.custom_fields.insert(field_name, to);
        }
    }
    Ok(())
}

fn mut_relationship_added(snap: &mut TaskSnapshot, event: &Event) -> ApplyResult<()> {
    let data = &event.data;
    let etype = &event.event_type;
    snap.relationships_out.push(Relationship {
        rel_type: field_str(data, "type", etype)?,
        target_task_id: field_str(data, "target_task_id", etype)?.into(),
        created_at: event.ts,
        created_by: event.actor.clone(),
        note: field_opt_str(data, "note"),
    });
    Ok(())
}

fn mut_relationship_removed(snap: &mut TaskSnapshot, event: &Event) -> ApplyResult<()> {
    let data = &event.data;
    let etype = &event.event_type;
    let rm_type = field_str(data, "type", etype)?;
    let rm_target = field_str(data, "target_task_id", etype)?;
    snap.relationships_out
        .retain(|r| !(r.rel_type == rm_type && r.target_task_id.as_str() == rm_target));
    Ok(())
}

fn mut_artifact_attached(snap: &mut TaskSnapshot, event: &Event) -> ApplyResult<()> {
    let data = &event.data;
    let etype = &event.event_type;
    let artifact_id = field_str(data, "artifact_id", etype)?;
    let role = field_opt_str(data, "role");
    let already_present = snap
        .evidence_refs
        .iter()
        .any(|r| r.source_type == EvidenceSourceType::Artifact && r.id == artifact_id);
    if !already_present {
        snap.evidence_refs.push(EvidenceRef { id: artifact_id, role, source_type: EvidenceSourceType::Artifact });
    }
    Ok(())
}

fn mut_branch_linked(snap: &mut TaskSnapshot, event: &Event) -> ApplyResult<()> {
    let data = &event.data;
    let etype = &event.event_type;
    snap.branch_links.push(BranchLink {
        branch: field_str(data, "branch", etype)?,
        repo: field_opt_str(data, "repo"),
        linked_at: event.ts,
        linked_by: event.actor.clone(),
    });
    Ok(())
}

fn mut_branch_unlinked(snap: &mut TaskSnapshot, event: &Event) -> ApplyResult<()> {
    let data = &event.data;
    let etype = &event.event_type;
    let rm_branch = field_str(data, "branch", etype)?;
    let rm_repo = field_opt_str(data, "repo");
    snap.branch_links.retain(|bl| !(bl.branch == rm_branch && bl.repo == rm_repo));
    Ok(())
}

fn mut_comment_added(snap: &mut TaskSnapshot, event: &Event) {
    snap.comment_count += 1;
    if let Some(role) = field_opt_str(&event.data, "role") {
        snap.evidence_refs.push(EvidenceRef {
            id: event.id.to_string(),
            role: Some(role),
            source_type: EvidenceSourceType::Comment,
        });
    }
}

/// Per spec.md §4.1: "`comment_edited` can add/change a role, updating or
/// adding the evidence ref for that comment ID." This differs from the
/// Python original, which treats `comment_edited` as a pure no-op; the
/// explicit spec text governs (see project decision log).
fn mut_comment_edited(snap: &mut TaskSnapshot, event: &Event) {
    let Some(comment_id) = field_opt_str(&event.data, "comment_id") else { return };
    let new_role = field_opt_str(&event.data, "role");
    if let Some(existing) = snap
        .evidence_refs
        .iter_mut()
        .find(|r| r.source_type == EvidenceSourceType::Comment && r.id == comment_id)
    {
        existing.role = new_role;
    } else if let Some(role) = new_role {
        snap.evidence_refs.push(EvidenceRef { id: comment_id, role: Some(role), source_type: EvidenceSourceType::Comment });
    }
}

fn mut_comment_deleted(snap: &mut TaskSnapshot, event: &Event) {
    snap.comment_count = snap.comment_count.saturating_sub(1);
    if let Some(comment_id) = field_opt_str(&event.data, "comment_id") {
        snap.evidence_refs
            .retain(|r| !(r.source_type == EvidenceSourceType::Comment && r.id == comment_id));
    }
}

fn mut_process_started(snap: &mut TaskSnapshot, event: &Event) -> ApplyResult<()> {
    let data = &event.data;
    let etype = &event.event_type;
    let entry = ActiveProcess {
        process_type: field_str(data, "process_type", etype)?,
        started_event_id: event.id.clone(),
        started_at: event.ts,
        commit_sha: field_opt_str(data, "commit_sha"),
    };
    snap.active_processes.get_or_insert_with(Vec::new).push(entry);
    Ok(())
}

fn mut_process_ended(snap: &mut TaskSnapshot, event: &Event) {
    let Some(process_type) = field_opt_str(&event.data, "process_type") else { return };
    if let Some(active) = &mut snap.active_processes {
        active.retain(|p| p.process_type != process_type);
    }
}

#[cfg(test)]
#[path = "apply_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task-lifecycle, query and config operation surface (spec.md §6.2)
//! that a CLI or other front end drives directly: everything that needs to
//! read a task's current snapshot, build one or more events from it, and
//! hand the batch to [`crate::writer::write_task_events`].
//!
//! Resource coordination and integrity/rebuild already expose a surface
//! thin enough ([`crate::resources`], [`crate::integrity`],
//! [`crate::rebuild`]) that front ends call those modules directly rather
//! than through a redundant wrapper here.
//!
//! Every function here takes an already-resolved [`TaskId`]; resolving a
//! short ID or bare ULID string to one is [`crate::ids::resolve`]'s job, run
//! by the caller before reaching this module.

use crate::artifacts::{store_artifact, ArtifactMeta};
use crate::convert::fs_err;
use crate::locks::CONFIG_KEY;
use crate::writer::write_task_events;
use lattice_core::event::event_type as et;
use lattice_core::{Actor, Config, Event, LatticeError, LatticeResult, TaskId, TaskSnapshot};
use lattice_fs::{atomic_write_json, read_json_opt, LatticeLayout};
use lattice_materialize::selection::{claim_transition_path, select_next};
use serde_json::{json, Value};
use std::time::Duration;

fn read_task_snapshot(layout: &LatticeLayout, task_id: &TaskId) -> LatticeResult<Option<TaskSnapshot>> {
    read_json_opt(&layout.task_snapshot_path(task_id)).map_err(fs_err)
}

fn read_archived_task_snapshot(layout: &LatticeLayout, task_id: &TaskId) -> LatticeResult<Option<TaskSnapshot>> {
    read_json_opt(&layout.archive_task_snapshot_path(task_id)).map_err(fs_err)
}

/// Load a task's snapshot from wherever it currently lives (active or
/// archived), failing `NotFound` if it exists in neither.
pub fn show(layout: &LatticeLayout, task_id: &TaskId) -> LatticeResult<TaskSnapshot> {
    if let Some(snap) = read_task_snapshot(layout, task_id)? {
        return Ok(snap);
    }
    if let Some(snap) = read_archived_task_snapshot(layout, task_id)? {
        return Ok(snap);
    }
    Err(LatticeError::NotFound { kind: "task", id: task_id.to_string() })
}

fn require_active(layout: &LatticeLayout, task_id: &TaskId) -> LatticeResult<TaskSnapshot> {
    read_task_snapshot(layout, task_id)?.ok_or_else(|| LatticeError::NotFound { kind: "task", id: task_id.to_string() })
}

/// The raw event log for a task, from whichever directory (active or
/// archived) currently holds it.
pub fn events(layout: &LatticeLayout, task_id: &TaskId) -> LatticeResult<Vec<Event>> {
    let path = if layout.task_events_path(task_id).exists() {
        layout.task_events_path(task_id)
    } else {
        layout.archive_task_events_path(task_id)
    };
    let read = lattice_fs::read_jsonl_tolerant(&path).map_err(fs_err)?;
    Ok(read.records)
}

/// `plan(task_id)` — read-only access to `plans/<id>.md`, if one exists.
pub fn plan(layout: &LatticeLayout, task_id: &TaskId) -> LatticeResult<Option<String>> {
    let path = layout.plan_path(task_id);
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(&path)
        .map(Some)
        .map_err(|source| fs_err(lattice_fs::FsError::Io { path, source }))
}

/// Filters accepted by [`list`]; every `Some` field narrows the result set.
#[derive(Debug, Clone, Default)]
pub struct ListFilter<'a> {
    pub status: Option<&'a str>,
    pub assigned: Option<&'a str>,
    pub tag: Option<&'a str>,
    pub task_type: Option<&'a str>,
    pub priority: Option<&'a str>,
    pub include_archived: bool,
}

fn load_all_snapshots(dir: &std::path::Path) -> LatticeResult<Vec<TaskSnapshot>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|source| fs_err(lattice_fs::FsError::Io { path: dir.to_path_buf(), source }))? {
        let entry = entry.map_err(|source| fs_err(lattice_fs::FsError::Io { path: dir.to_path_buf(), source }))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(snap) = read_json_opt::<TaskSnapshot>(&path).map_err(fs_err)? {
            out.push(snap);
        }
    }
    Ok(out)
}

/// `list(status?, assigned?, tag?, type?, priority?)` — active tasks by
/// default; `include_archived` also folds in `archive/tasks/`.
pub fn list(layout: &LatticeLayout, filter: &ListFilter<'_>) -> LatticeResult<Vec<TaskSnapshot>> {
    let mut snapshots = load_all_snapshots(&layout.tasks_dir())?;
    if filter.include_archived {
        snapshots.extend(load_all_snapshots(&layout.archive_tasks_dir())?);
    }
    snapshots.retain(|s| filter.status.is_none_or(|v| s.status == v));
    snapshots.retain(|s| filter.task_type.is_none_or(|v| s.task_type == v));
    snapshots.retain(|s| filter.priority.is_none_or(|v| s.priority == v));
    snapshots.retain(|s| filter.tag.is_none_or(|v| s.tags.as_deref().is_some_and(|tags| tags.iter().any(|t| t == v))));
    snapshots.retain(|s| filter.assigned.is_none_or(|v| s.assigned_to.as_ref().is_some_and(|a| a.resume_key() == v)));
    snapshots.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    Ok(snapshots)
}

/// `next(actor?, claim?)` — pure selection over the active pool (spec.md
/// §4.8). Claiming is a separate step: see [`claim_next`].
pub fn next(layout: &LatticeLayout, actor: Option<&Actor>, ready_statuses: Option<&[&str]>) -> LatticeResult<Option<TaskSnapshot>> {
    let snapshots = load_all_snapshots(&layout.tasks_dir())?;
    Ok(select_next(&snapshots, actor, ready_statuses).cloned())
}

const DEFAULT_READY_STATUSES: &[&str] = &["backlog", "planned"];

/// `next --claim` — select, then in one transactional write: reassign the
/// task to the claiming actor, walk the BFS transition path to
/// `in_progress` emitting one `status_changed` per hop, and record a
/// `process_started` event so `active_processes` reflects the winner
/// (spec.md §4.8; worker subprocess lifecycle itself is out of scope here,
/// only the bookkeeping events are).
///
/// Selection reads the pool unlocked, but the snapshot is re-read
/// immediately before the write: if some other claim won the race in the
/// meantime and left the task assigned to someone else outside the ready
/// set, this fails with [`LatticeError::AlreadyClaimed`] naming the current
/// owner rather than silently reassigning out from under them.
pub fn claim_next(
    layout: &LatticeLayout,
    actor: &Actor,
    ready_statuses: Option<&[&str]>,
    workflow: &lattice_core::WorkflowConfig,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<Option<TaskSnapshot>> {
    let snapshots = load_all_snapshots(&layout.tasks_dir())?;
    let Some(selected) = select_next(&snapshots, Some(actor), ready_statuses) else {
        return Ok(None);
    };
    let task_id = selected.id.clone();
    let ready = ready_statuses.unwrap_or(DEFAULT_READY_STATUSES);

    let prior = require_active(layout, &task_id)?;
    if let Some(owner) = &prior.assigned_to {
        if owner.resume_key() != actor.resume_key() && !ready.contains(&prior.status.as_str()) {
            return Err(LatticeError::AlreadyClaimed { owner: owner.resume_key().to_string() });
        }
    }

    let start_status = prior.status.clone();
    let path = claim_transition_path(workflow, &start_status)
        .ok_or_else(|| LatticeError::InvalidTransition { from: start_status.clone(), to: "in_progress".to_string() })?;

    let mut batch = Vec::with_capacity(path.len() + 2);
    batch.push(Event::for_task(task_id.clone(), et::ASSIGNMENT_CHANGED, now, actor.clone(), json!({"to": actor})));
    let mut from = start_status;
    for to in &path {
        batch.push(Event::for_task(task_id.clone(), et::STATUS_CHANGED, now, actor.clone(), json!({"from": from, "to": to})));
        from = to.clone();
    }
    batch.push(Event::for_task(task_id.clone(), et::PROCESS_STARTED, now, actor.clone(), json!({"process_type": "claim"})));

    let snap = write_task_events(layout, &task_id, Some(prior), &batch, workflow, lock_timeout)?;
    Ok(Some(snap))
}

/// Fields accepted by [`create`]. `id` lets a caller retry idempotently
/// (spec.md §8 scenario 1): a repeat `create` with the same `id` and the
/// same values for every `Some` field returns the existing snapshot;
/// a repeat with a differing value is `Conflict`.
#[derive(Debug, Clone)]
pub struct CreateTaskInput<'a> {
    pub id: Option<TaskId>,
    pub title: &'a str,
    pub status: Option<&'a str>,
    pub priority: Option<&'a str>,
    pub task_type: &'a str,
    pub description: Option<&'a str>,
    pub tags: Option<Vec<String>>,
    pub assigned_to: Option<Actor>,
    pub urgency: Option<&'a str>,
    pub complexity: Option<&'a str>,
    pub custom_fields: Value,
}

fn matches_existing(existing: &TaskSnapshot, input: &CreateTaskInput<'_>) -> bool {
    existing.title == input.title
        && input.status.is_none_or(|v| existing.status == v)
        && input.priority.is_none_or(|v| existing.priority == v)
        && existing.task_type == input.task_type
        && input.description.is_none_or(|v| existing.description.as_deref() == Some(v))
        && input.tags.as_ref().is_none_or(|v| existing.tags.as_deref() == Some(v.as_slice()))
        && input.assigned_to.as_ref().is_none_or(|v| existing.assigned_to.as_ref() == Some(v))
}

#[allow(clippy::too_many_arguments)]
pub fn create(
    layout: &LatticeLayout,
    config: &Config,
    input: CreateTaskInput<'_>,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    let task_id = input.id.clone().unwrap_or_else(TaskId::generate);

    if let Some(existing) = read_task_snapshot(layout, &task_id)? {
        if matches_existing(&existing, &input) {
            return Ok(existing);
        }
        return Err(LatticeError::Conflict(format!("task '{task_id}' already exists with different fields")));
    }

    let data = json!({
        "title": input.title,
        "status": input.status.unwrap_or(&config.default_status),
        "priority": input.priority.unwrap_or(&config.default_priority),
        "type": input.task_type,
        "description": input.description,
        "tags": input.tags,
        "assigned_to": input.assigned_to,
        "urgency": input.urgency,
        "complexity": input.complexity,
        "custom_fields": input.custom_fields,
    });
    let created = Event::for_task(task_id.clone(), et::TASK_CREATED, now, actor.clone(), data);
    let snap = write_task_events(layout, &task_id, None, &[created], &config.workflow, lock_timeout)?;

    match short_id_prefix(config) {
        Some(prefix) => assign_short_id(layout, &task_id, &prefix, snap, &config.workflow, actor, now, lock_timeout),
        None => Ok(snap),
    }
}

fn short_id_prefix(config: &Config) -> Option<String> {
    match (&config.project_code, &config.subproject_code) {
        (Some(p), Some(s)) => Some(format!("{p}-{s}")),
        (Some(p), None) => Some(p.clone()),
        (None, _) => None,
    }
}

#[allow(clippy::too_many_arguments)]
fn assign_short_id(
    layout: &LatticeLayout,
    task_id: &TaskId,
    prefix: &str,
    prior: TaskSnapshot,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    let (short_id, _n) = crate::ids::allocate(layout, prefix, task_id, lock_timeout)?;
    let event = Event::for_task(task_id.clone(), et::TASK_SHORT_ID_ASSIGNED, now, actor.clone(), json!({"short_id": short_id}));
    write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)
}

/// `update(field, to)` — rejects protected fields (I3) via
/// [`lattice_materialize::ApplyError::ProtectedField`], surfaced by
/// `write_task_events` through [`crate::convert::apply_err`].
pub fn update(
    layout: &LatticeLayout,
    task_id: &TaskId,
    field: &str,
    to: Value,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    let prior = require_active(layout, task_id)?;
    let event = Event::for_task(task_id.clone(), et::FIELD_UPDATED, now, actor.clone(), json!({"field": field, "to": to}));
    write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)
}

/// `status(to, force?, reason?)` — validates the transition against
/// `workflow.transitions`/`universal_targets` unless forced with a reason;
/// the completion-policy gate itself is enforced inside `write_task_events`.
pub fn set_status(
    layout: &LatticeLayout,
    task_id: &TaskId,
    to: &str,
    force_reason: Option<&str>,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    let prior = require_active(layout, task_id)?;
    let forced = force_reason.is_some_and(|r| !r.is_empty());
    if !forced && !workflow.validate_transition(&prior.status, to) {
        return Err(LatticeError::InvalidTransition { from: prior.status.clone(), to: to.to_string() });
    }
    let mut data = json!({"from": prior.status, "to": to});
    if let Some(reason) = force_reason {
        data["force"] = json!(true);
        data["reason"] = json!(reason);
    }
    let event = Event::for_task(task_id.clone(), et::STATUS_CHANGED, now, actor.clone(), data);
    write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)
}

pub fn assign(
    layout: &LatticeLayout,
    task_id: &TaskId,
    to: Option<&Actor>,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    let prior = require_active(layout, task_id)?;
    let event = Event::for_task(task_id.clone(), et::ASSIGNMENT_CHANGED, now, actor.clone(), json!({"to": to}));
    write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)
}

fn check_role(workflow: &lattice_core::WorkflowConfig, role: &str) -> LatticeResult<()> {
    if workflow.is_role_accepted(role) {
        return Ok(());
    }
    let valid: Vec<String> = workflow.accepted_roles().into_iter().collect();
    Err(LatticeError::InvalidRole { role: role.to_string(), valid })
}

#[allow(clippy::too_many_arguments)]
pub fn comment(
    layout: &LatticeLayout,
    task_id: &TaskId,
    body: &str,
    role: Option<&str>,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    if let Some(role) = role {
        check_role(workflow, role)?;
    }
    let prior = require_active(layout, task_id)?;
    let event = Event::for_task(task_id.clone(), et::COMMENT_ADDED, now, actor.clone(), json!({"body": body, "role": role}));
    write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)
}

#[allow(clippy::too_many_arguments)]
pub fn edit_comment(
    layout: &LatticeLayout,
    task_id: &TaskId,
    comment_id: &str,
    body: Option<&str>,
    role: Option<&str>,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    if let Some(role) = role {
        check_role(workflow, role)?;
    }
    let prior = require_active(layout, task_id)?;
    let event = Event::for_task(task_id.clone(), et::COMMENT_EDITED, now, actor.clone(), json!({"comment_id": comment_id, "body": body, "role": role}));
    write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)
}

pub fn delete_comment(
    layout: &LatticeLayout,
    task_id: &TaskId,
    comment_id: &str,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    let prior = require_active(layout, task_id)?;
    let event = Event::for_task(task_id.clone(), et::COMMENT_DELETED, now, actor.clone(), json!({"comment_id": comment_id}));
    write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)
}

pub fn react(
    layout: &LatticeLayout,
    task_id: &TaskId,
    comment_id: &str,
    emoji: &str,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    let prior = require_active(layout, task_id)?;
    let event = Event::for_task(task_id.clone(), et::REACTION_ADDED, now, actor.clone(), json!({"comment_id": comment_id, "emoji": emoji}));
    write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)
}

pub fn unreact(
    layout: &LatticeLayout,
    task_id: &TaskId,
    comment_id: &str,
    emoji: &str,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    let prior = require_active(layout, task_id)?;
    let event = Event::for_task(task_id.clone(), et::REACTION_REMOVED, now, actor.clone(), json!({"comment_id": comment_id, "emoji": emoji}));
    write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)
}

/// `link(type, target)` — rejects unknown relationship types, self-links
/// (I7) and duplicate `(type, target)` pairs (spec.md §4.1: duplicates are
/// rejected at the write layer, not inside `apply`, to keep replay pure).
pub fn link(
    layout: &LatticeLayout,
    task_id: &TaskId,
    rel_type: &str,
    target_task_id: &TaskId,
    note: Option<&str>,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    if !lattice_core::RELATIONSHIP_TYPES.contains(&rel_type) {
        return Err(LatticeError::Validation(format!(
            "relationship type '{rel_type}' is not one of {:?}",
            lattice_core::RELATIONSHIP_TYPES
        )));
    }
    if target_task_id == task_id {
        return Err(LatticeError::Validation("a task cannot link to itself".to_string()));
    }
    let prior = require_active(layout, task_id)?;
    if prior.relationships_out.iter().any(|r| r.rel_type == rel_type && r.target_task_id == *target_task_id) {
        return Err(LatticeError::Conflict(format!("relationship '{rel_type}' to '{target_task_id}' already exists")));
    }
    let event = Event::for_task(task_id.clone(), et::RELATIONSHIP_ADDED, now, actor.clone(), json!({"type": rel_type, "target_task_id": target_task_id.to_string(), "note": note}));
    write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)
}

pub fn unlink(
    layout: &LatticeLayout,
    task_id: &TaskId,
    rel_type: &str,
    target_task_id: &TaskId,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    let prior = require_active(layout, task_id)?;
    let event = Event::for_task(task_id.clone(), et::RELATIONSHIP_REMOVED, now, actor.clone(), json!({"type": rel_type, "target_task_id": target_task_id.to_string()}));
    write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)
}

pub fn branch_link(
    layout: &LatticeLayout,
    task_id: &TaskId,
    branch: &str,
    repo: Option<&str>,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    let prior = require_active(layout, task_id)?;
    if prior.branch_links.iter().any(|bl| bl.branch == branch && bl.repo.as_deref() == repo) {
        return Err(LatticeError::Conflict(format!("branch '{branch}' is already linked")));
    }
    let event = Event::for_task(task_id.clone(), et::BRANCH_LINKED, now, actor.clone(), json!({"branch": branch, "repo": repo}));
    write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)
}

pub fn branch_unlink(
    layout: &LatticeLayout,
    task_id: &TaskId,
    branch: &str,
    repo: Option<&str>,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    let prior = require_active(layout, task_id)?;
    let event = Event::for_task(task_id.clone(), et::BRANCH_UNLINKED, now, actor.clone(), json!({"branch": branch, "repo": repo}));
    write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)
}

/// `attach(filename, content_type?, role?, bytes)` — hashes and stores the
/// payload first (no lock needed, ID is fresh), then emits
/// `artifact_attached` under the usual task write lock.
#[allow(clippy::too_many_arguments)]
pub fn attach(
    layout: &LatticeLayout,
    task_id: &TaskId,
    filename: &str,
    content_type: Option<&str>,
    role: Option<&str>,
    content: &[u8],
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<(TaskSnapshot, ArtifactMeta)> {
    if let Some(role) = role {
        check_role(workflow, role)?;
    }
    let prior = require_active(layout, task_id)?;
    let meta = store_artifact(layout, task_id, filename, content_type, content, actor, now)?;
    let event = Event::for_task(task_id.clone(), et::ARTIFACT_ATTACHED, now, actor.clone(), json!({"artifact_id": meta.id.to_string(), "role": role}));
    let snap = write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)?;
    Ok((snap, meta))
}

/// A caller-defined `x_`-prefixed event: no snapshot mutation beyond the
/// usual bookkeeping, never mirrored to the lifecycle log (spec.md §3).
pub fn custom_event(
    layout: &LatticeLayout,
    task_id: &TaskId,
    event_type: &str,
    data: Value,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    if !lattice_core::event::is_custom_event_type(event_type) {
        return Err(LatticeError::Validation(format!("custom event type '{event_type}' must start with 'x_'")));
    }
    let prior = require_active(layout, task_id)?;
    let event = Event::for_task(task_id.clone(), event_type, now, actor.clone(), data);
    write_task_events(layout, task_id, Some(prior), &[event], workflow, lock_timeout)
}

/// `archive(reason?)` / `unarchive()` — thin wrappers over
/// [`crate::archive`] that load the current snapshot from wherever it is.
pub fn archive(layout: &LatticeLayout, task_id: &TaskId, actor: Actor, reason: Option<&str>, now: chrono::DateTime<chrono::Utc>, lock_timeout: Duration) -> LatticeResult<TaskSnapshot> {
    let prior = require_active(layout, task_id)?;
    crate::archive::archive_task(layout, task_id, prior, actor, reason, now, lock_timeout)
}

pub fn unarchive(layout: &LatticeLayout, task_id: &TaskId, actor: Actor, now: chrono::DateTime<chrono::Utc>, lock_timeout: Duration) -> LatticeResult<TaskSnapshot> {
    let prior = read_archived_task_snapshot(layout, task_id)?.ok_or_else(|| LatticeError::NotFound { kind: "task", id: task_id.to_string() })?;
    crate::archive::unarchive_task(layout, task_id, prior, actor, now, lock_timeout)
}

/// `complete(comment, review_role="review", artifact?)` — one transaction:
/// a review comment, an optional hop to `review` if not already there, an
/// optional review artifact, then a hop to `done` (spec.md §6.2
/// "Compound"). All events fold through the same prior snapshot in order,
/// so the `done` completion-policy gate sees the comment (and artifact)
/// this same call just added.
pub struct CompleteInput<'a> {
    pub review_comment: &'a str,
    pub review_role: &'a str,
    pub artifact: Option<(&'a str, Option<&'a str>, &'a [u8])>,
}

pub fn complete(
    layout: &LatticeLayout,
    task_id: &TaskId,
    input: CompleteInput<'_>,
    workflow: &lattice_core::WorkflowConfig,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<TaskSnapshot> {
    check_role(workflow, input.review_role)?;
    let prior = require_active(layout, task_id)?;

    let mut batch = vec![Event::for_task(
        task_id.clone(),
        et::COMMENT_ADDED,
        now,
        actor.clone(),
        json!({"body": input.review_comment, "role": input.review_role}),
    )];

    if prior.status != "review" {
        batch.push(Event::for_task(task_id.clone(), et::STATUS_CHANGED, now, actor.clone(), json!({"from": prior.status, "to": "review"})));
    }

    if let Some((filename, content_type, content)) = input.artifact {
        let meta = store_artifact(layout, task_id, filename, content_type, content, actor, now)?;
        batch.push(Event::for_task(task_id.clone(), et::ARTIFACT_ATTACHED, now, actor.clone(), json!({"artifact_id": meta.id.to_string(), "role": input.review_role})));
    }

    batch.push(Event::for_task(task_id.clone(), et::STATUS_CHANGED, now, actor.clone(), json!({"from": "review", "to": "done"})));

    write_task_events(layout, task_id, Some(prior), &batch, workflow, lock_timeout)
}

fn load_config(layout: &LatticeLayout) -> LatticeResult<Config> {
    Ok(read_json_opt(&layout.config_path()).map_err(fs_err)?.unwrap_or_default())
}

pub fn read_config(layout: &LatticeLayout) -> LatticeResult<Config> {
    load_config(layout)
}

fn write_config_locked(layout: &LatticeLayout, lock_timeout: Duration, mutate: impl FnOnce(&mut Config)) -> LatticeResult<Config> {
    let _guard = lattice_lock::acquire(&layout.locks_dir(), CONFIG_KEY, lock_timeout).map_err(crate::convert::lock_err)?;
    let mut config = load_config(layout)?;
    mutate(&mut config);
    atomic_write_json(&layout.config_path(), &config).map_err(fs_err)?;
    Ok(config)
}

pub fn set_project_code(layout: &LatticeLayout, code: &str, lock_timeout: Duration) -> LatticeResult<Config> {
    write_config_locked(layout, lock_timeout, |config| config.project_code = Some(code.to_string()))
}

pub fn set_subproject_code(layout: &LatticeLayout, code: &str, lock_timeout: Duration) -> LatticeResult<Config> {
    write_config_locked(layout, lock_timeout, |config| config.subproject_code = Some(code.to_string()))
}

#[cfg(test)]
#[path = "ops_tests.rs"]
mod tests;

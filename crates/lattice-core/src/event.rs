// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only event envelope (spec.md §3 "Event").
//!
//! `data` is kept as a loosely-typed [`serde_json::Value`] rather than a
//! closed Rust enum: unknown built-in types must deserialize successfully
//! and be ignored by the materializer (forward compatibility), and `x_`
//! custom types carry arbitrary caller-defined payloads. Per-type shape is
//! enforced where it matters by `lattice-materialize`, which deserializes
//! `data` into a typed struct for each known `type` it handles.

use crate::actor::Actor;
use crate::id::{EventId, ResourceId, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SCHEMA_VERSION: u32 = 1;

/// Built-in event types that mutate or are recognized by the materializer.
///
/// Not exhaustive of everything that may appear on disk (unknown types are
/// tolerated), but exhaustive of everything this crate's event constructors
/// know how to build.
pub mod event_type {
    pub const TASK_CREATED: &str = "task_created";
    pub const STATUS_CHANGED: &str = "status_changed";
    pub const ASSIGNMENT_CHANGED: &str = "assignment_changed";
    pub const FIELD_UPDATED: &str = "field_updated";
    pub const COMMENT_ADDED: &str = "comment_added";
    pub const COMMENT_EDITED: &str = "comment_edited";
    pub const COMMENT_DELETED: &str = "comment_deleted";
    pub const REACTION_ADDED: &str = "reaction_added";
    pub const REACTION_REMOVED: &str = "reaction_removed";
    pub const RELATIONSHIP_ADDED: &str = "relationship_added";
    pub const RELATIONSHIP_REMOVED: &str = "relationship_removed";
    pub const ARTIFACT_ATTACHED: &str = "artifact_attached";
    pub const BRANCH_LINKED: &str = "branch_linked";
    pub const BRANCH_UNLINKED: &str = "branch_unlinked";
    pub const TASK_ARCHIVED: &str = "task_archived";
    pub const TASK_UNARCHIVED: &str = "task_unarchived";
    pub const TASK_SHORT_ID_ASSIGNED: &str = "task_short_id_assigned";
    pub const PROCESS_STARTED: &str = "process_started";
    pub const PROCESS_COMPLETED: &str = "process_completed";
    pub const PROCESS_FAILED: &str = "process_failed";
    pub const GIT_EVENT: &str = "git_event";

    pub const RESOURCE_CREATED: &str = "resource_created";
    pub const RESOURCE_ACQUIRED: &str = "resource_acquired";
    pub const RESOURCE_RELEASED: &str = "resource_released";
    pub const RESOURCE_HEARTBEAT: &str = "resource_heartbeat";
    pub const RESOURCE_EXPIRED: &str = "resource_expired";

    /// Event types mirrored to the global lifecycle log (I5).
    pub const LIFECYCLE_TYPES: &[&str] = &[TASK_CREATED, TASK_ARCHIVED, TASK_UNARCHIVED];
}

/// True if `lifecycle.jsonl` must also receive this event (spec.md §3, I5).
pub fn is_lifecycle_event(event_type: &str) -> bool {
    event_type::LIFECYCLE_TYPES.contains(&event_type)
}

/// Custom event types must start with `x_`; they never touch the lifecycle
/// log and never mutate the snapshot beyond bookkeeping (spec.md §3).
pub fn is_custom_event_type(event_type: &str) -> bool {
    event_type.starts_with("x_")
}

/// `triggered_by` / `on_behalf_of` / `reason`, plus any caller-defined keys
/// preserved verbatim on round-trip (spec.md §9, "Ambiguous source
/// behaviors").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_behalf_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The entity an event is about: exactly one of `task_id` or `resource_id`
/// is present on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    Task { task_id: TaskId },
    Resource { resource_id: ResourceId },
}

impl Subject {
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Subject::Task { task_id } => Some(task_id),
            Subject::Resource { .. } => None,
        }
    }

    pub fn resource_id(&self) -> Option<&ResourceId> {
        match self {
            Subject::Resource { resource_id } => Some(resource_id),
            Subject::Task { .. } => None,
        }
    }

    /// The log file stem this event belongs to, e.g. `task_01…` or
    /// `res_01…` (resource logs are named `res_<id>.jsonl` per spec.md §4.2).
    pub fn log_stem(&self) -> String {
        match self {
            Subject::Task { task_id } => task_id.as_str().to_string(),
            Subject::Resource { resource_id } => resource_id.as_str().to_string(),
        }
    }
}

/// An immutable append-only event record (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub schema_version: u32,
    pub id: EventId,
    pub ts: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(flatten)]
    pub subject: Subject,
    pub actor: Actor,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

impl Event {
    /// Build a new event for a task, stamping `schema_version` and `id`.
    /// `id` generation is a write-time concern (never derived from replay,
    /// per the determinism requirement in spec.md §4.1).
    pub fn for_task(
        task_id: TaskId,
        event_type: impl Into<String>,
        ts: chrono::DateTime<chrono::Utc>,
        actor: Actor,
        data: Value,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            id: EventId::generate(),
            ts,
            event_type: event_type.into(),
            subject: Subject::Task { task_id },
            actor,
            data,
            model: None,
            session: None,
            provenance: None,
        }
    }

    pub fn for_resource(
        resource_id: ResourceId,
        event_type: impl Into<String>,
        ts: chrono::DateTime<chrono::Utc>,
        actor: Actor,
        data: Value,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            id: EventId::generate(),
            ts,
            event_type: event_type.into(),
            subject: Subject::Resource { resource_id },
            actor,
            data,
            model: None,
            session: None,
            provenance: None,
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// Serialize as a canonical single-line JSON record with a trailing
    /// newline, suitable for direct JSONL append (spec.md §4.1, §6.1).
    pub fn to_jsonl_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

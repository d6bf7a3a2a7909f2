// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized views: [`TaskSnapshot`] and [`ResourceSnapshot`] (spec.md §3).
//!
//! Snapshots are never mutated directly outside the materializer's
//! `apply(snapshot, event) -> snapshot` function; this module only defines
//! their shape and the canonical-serialization helper shared by the write
//! path and the rebuild path.

use crate::actor::Actor;
use crate::id::{EventId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::collections::BTreeMap;

/// Fields that `field_updated` may never target; each has a dedicated event
/// type instead (spec.md I3).
pub const PROTECTED_FIELDS: &[&str] = &[
    "schema_version",
    "id",
    "short_id",
    "created_at",
    "created_by",
    "updated_at",
    "done_at",
    "last_event_id",
    "status",
    "assigned_to",
    "relationships_out",
    "evidence_refs",
    "branch_links",
    "comment_count",
    "reopened_count",
    "custom_fields",
];

pub fn is_protected_field(field: &str) -> bool {
    PROTECTED_FIELDS.contains(&field)
        || field
            .split_once('.')
            .is_some_and(|(head, _)| PROTECTED_FIELDS.contains(&head))
}

/// Valid `relationship_added`/`relationship_removed` edge kinds (spec.md §4.1).
pub const RELATIONSHIP_TYPES: &[&str] = &[
    "blocks",
    "depends_on",
    "subtask_of",
    "related_to",
    "spawned_by",
    "duplicate_of",
    "supersedes",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "type")]
    pub rel_type: String,
    pub target_task_id: TaskId,
    pub created_at: DateTime<Utc>,
    pub created_by: Actor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Where an [`EvidenceRef`] points: an attached artifact or a role-tagged
/// comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSourceType {
    Artifact,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub source_type: EvidenceSourceType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchLink {
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    pub linked_at: DateTime<Utc>,
    pub linked_by: Actor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveProcess {
    pub process_type: String,
    pub started_event_id: EventId,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}

/// Materialized view of a task's event log (spec.md §3 "Task snapshot").
///
/// `custom_fields` uses a [`BTreeMap`] rather than `serde_json::Map` so that
/// canonical serialization (sorted keys) falls out of the type itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub schema_version: u32,
    pub id: TaskId,
    pub title: String,
    pub status: String,
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Actor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
    pub created_by: Actor,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub relationships_out: Vec<Relationship>,
    #[serde(default)]
    pub evidence_refs: Vec<EvidenceRef>,
    #[serde(default)]
    pub branch_links: Vec<BranchLink>,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub reopened_count: u64,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_processes: Option<Vec<ActiveProcess>>,
    pub last_event_id: EventId,
}

impl TaskSnapshot {
    /// Canonical on-disk representation: sorted keys, 2-space indent,
    /// trailing newline (spec.md §4.1, §6.1).
    ///
    /// `serde_json`'s struct field order is declaration order, which for
    /// `BTreeMap` custom_fields is already key-sorted; top-level struct keys
    /// are declared in the same order as the spec's field list so this is
    /// stable across versions without needing a generic key-sort pass.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        canonical_json(self)
    }

    pub fn evidence_ref_with_role(&self, role: &str) -> Option<&EvidenceRef> {
        self.evidence_refs
            .iter()
            .find(|r| r.role.as_deref() == Some(role))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHolder {
    pub actor: Actor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Materialized view of a resource's event log (spec.md §3 "Resource
/// snapshot").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub max_holders: u32,
    pub ttl_seconds: u64,
    #[serde(default)]
    pub holders: Vec<ResourceHolder>,
    pub created_at: DateTime<Utc>,
    pub created_by: Actor,
    pub last_event_id: EventId,
}

impl ResourceSnapshot {
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        canonical_json(self)
    }

    /// Holders whose lease has not yet lapsed, as of `now` (I8).
    pub fn live_holders(&self, now: DateTime<Utc>) -> impl Iterator<Item = &ResourceHolder> {
        self.holders.iter().filter(move |h| h.expires_at >= now)
    }
}

/// Re-serialize through a `BTreeMap`-backed sorted key structure, 2-space
/// indent, trailing newline. Used for both snapshot types so the round-trip
/// byte-identity requirement (I2) holds regardless of struct field order.
fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let raw = serde_json::to_value(value)?;
    let sorted = sort_keys(raw);
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, serde_json::ser::PrettyFormatter::with_indent(b"  "));
    sorted.serialize(&mut ser)?;
    let mut out = String::from_utf8(buf).expect("serde_json only emits valid utf8");
    out.push('\n');
    Ok(out)
}

fn sort_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut sorted = Map::new();
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            for k in keys {
                let v = map.get(&k).cloned().unwrap_or(serde_json::Value::Null);
                sorted.insert(k, sort_keys(v));
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sort_keys).collect())
        }
        other => other,
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;

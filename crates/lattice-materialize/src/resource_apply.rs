// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `apply_resource(snapshot, event) -> snapshot`, the resource analogue of
//! [`crate::apply::apply`] (spec.md §3 "Resource snapshot", §4.6).

use crate::error::{ApplyError, ApplyResult};
use lattice_core::event::event_type as et;
use lattice_core::{Actor, Event, ResourceHolder, ResourceSnapshot};
use serde_json::Value;

fn field_str(data: &Value, name: &'static str, event_type: &str) -> ApplyResult<String> {
    data.get(name)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ApplyError::MissingField(name, event_type.to_string()))
}

fn field_u64(data: &Value, name: &'static str, event_type: &str) -> ApplyResult<u64> {
    data.get(name)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| ApplyError::MissingField(name, event_type.to_string()))
}

pub fn apply_resource(
    snapshot: Option<ResourceSnapshot>,
    event: &Event,
) -> ApplyResult<ResourceSnapshot> {
    let mut snap = if event.event_type == et::RESOURCE_CREATED {
        init_resource(event)?
    } else {
        let Some(existing) = snapshot else {
            return Err(ApplyError::NoInitialSnapshot { event_type: event.event_type.clone() });
        };
        let mut snap = existing;
        apply_resource_mutation(&mut snap, event)?;
        snap
    };
    snap.last_event_id = event.id.clone();
    Ok(snap)
}

fn init_resource(event: &Event) -> ApplyResult<ResourceSnapshot> {
    let data = &event.data;
    let Some(resource_id) = event.subject.resource_id().cloned() else {
        return Err(ApplyError::MissingField("resource_id", event.event_type.clone()));
    };
    Ok(ResourceSnapshot {
        id: resource_id.to_string(),
        name: field_str(data, "name", &event.event_type)?,
        description: data.get("description").and_then(|v| v.as_str()).map(str::to_string),
        max_holders: field_u64(data, "max_holders", &event.event_type)? as u32,
        ttl_seconds: field_u64(data, "ttl_seconds", &event.event_type)?,
        holders: vec![],
        created_at: event.ts,
        created_by: event.actor.clone(),
        last_event_id: event.id.clone(),
    })
}

fn apply_resource_mutation(snap: &mut ResourceSnapshot, event: &Event) -> ApplyResult<()> {
    let data = &event.data;
    let etype = event.event_type.as_str();
    match etype {
        et::RESOURCE_ACQUIRED => {
            let actor: Actor = data
                .get("actor")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| ApplyError::MalformedData { field: "actor", event_type: etype.to_string(), message: e.to_string() })?
                .unwrap_or_else(|| event.actor.clone());
            let task_id = data.get("task_id").and_then(|v| v.as_str()).map(Into::into);
            let ttl = field_u64(data, "ttl_seconds", etype).unwrap_or(snap.ttl_seconds);
            snap.holders.push(ResourceHolder {
                actor,
                task_id,
                acquired_at: event.ts,
                expires_at: event.ts + chrono::Duration::seconds(ttl as i64),
            });
        }
        et::RESOURCE_RELEASED => {
            let actor_key = field_str(data, "actor", etype).unwrap_or_else(|_| event.actor.resume_key().to_string());
            if let Some(idx) = snap.holders.iter().position(|h| h.actor.resume_key() == actor_key) {
                snap.holders.remove(idx);
            }
        }
        et::RESOURCE_HEARTBEAT => {
            let actor_key = field_str(data, "actor", etype).unwrap_or_else(|_| event.actor.resume_key().to_string());
            let ttl = field_u64(data, "ttl_seconds", etype).unwrap_or(snap.ttl_seconds);
            if let Some(holder) = snap.holders.iter_mut().find(|h| h.actor.resume_key() == actor_key) {
                holder.expires_at = event.ts + chrono::Duration::seconds(ttl as i64);
            }
        }
        et::RESOURCE_EXPIRED => {
            let actor_key = field_str(data, "actor", etype).unwrap_or_else(|_| event.actor.resume_key().to_string());
            snap.holders.retain(|h| h.actor.resume_key() != actor_key);
        }
        other if lattice_core::event::is_custom_event_type(other) => {}
        other => {
            tracing::warn!(event_type = other, "unknown resource event type ignored during materialization");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "resource_apply_tests.rs"]
mod tests;

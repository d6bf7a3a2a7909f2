// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource coordination: leased locks with TTL + heartbeat extension
//! (spec.md §4.6). Distinct from [`crate::locks`], which serializes access
//! to the resource's own event log and snapshot file while this module's
//! leases model application-level mutual exclusion between actors.

use crate::convert::{apply_err, fs_err, lock_err};
use crate::locks::resources_key;
use lattice_core::event::event_type as et;
use lattice_core::{Actor, Event, LatticeError, LatticeResult, ResourceId, ResourceSnapshot};
use lattice_fs::{append_json_line, atomic_write_str, read_json_opt, LatticeLayout};
use lattice_materialize::apply_resource;
use serde_json::json;
use std::time::Duration;

const POLL_START: Duration = Duration::from_millis(100);
const POLL_CAP: Duration = Duration::from_secs(1);

fn load_snapshot(layout: &LatticeLayout, name: &str) -> LatticeResult<Option<ResourceSnapshot>> {
    read_json_opt(&layout.resource_snapshot_path(name)).map_err(fs_err)
}

fn persist(layout: &LatticeLayout, resource_id: &ResourceId, name: &str, event: &Event, snap: ResourceSnapshot) -> LatticeResult<ResourceSnapshot> {
    append_json_line(&layout.resource_events_path(resource_id), event).map_err(fs_err)?;
    let text = snap.to_canonical_json().map_err(LatticeError::from)?;
    atomic_write_str(&layout.resource_snapshot_path(name), &text).map_err(fs_err)?;
    Ok(snap)
}

/// `create(name, max_holders, ttl_seconds, description?)` — idempotent on an
/// existing resource with identical config; conflict otherwise.
pub fn create(
    layout: &LatticeLayout,
    name: &str,
    max_holders: u32,
    ttl_seconds: u64,
    description: Option<&str>,
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
    lock_timeout: Duration,
) -> LatticeResult<ResourceSnapshot> {
    let _guard = lattice_lock::acquire(&layout.locks_dir(), &resources_key(name), lock_timeout).map_err(lock_err)?;
    if let Some(existing) = load_snapshot(layout, name)? {
        if existing.max_holders == max_holders && existing.ttl_seconds == ttl_seconds && existing.description.as_deref() == description {
            return Ok(existing);
        }
        return Err(LatticeError::Conflict(format!("resource '{name}' already exists with different configuration")));
    }
    let resource_id = ResourceId::generate();
    let event = Event::for_resource(
        resource_id.clone(),
        et::RESOURCE_CREATED,
        now,
        actor.clone(),
        json!({"name": name, "max_holders": max_holders, "ttl_seconds": ttl_seconds, "description": description}),
    );
    let snap = apply_resource(None, &event).map_err(apply_err)?;
    persist(layout, &resource_id, name, &event, snap)
}

enum AcquireOutcome {
    Acquired(ResourceSnapshot),
    WouldBlock,
}

/// One lock-held pass of the acquire algorithm (spec.md §4.6, steps 1-5).
fn try_acquire_once(
    layout: &LatticeLayout,
    name: &str,
    actor: &Actor,
    task_id: Option<&str>,
    force: bool,
    config: Option<&lattice_core::config::ResourceConfigEntry>,
    now: chrono::DateTime<chrono::Utc>,
) -> LatticeResult<AcquireOutcome> {
    let Some(mut snap) = load_snapshot(layout, name)? else {
        let Some(cfg) = config else {
            return Err(LatticeError::NotFound { kind: "resource", id: name.to_string() });
        };
        let resource_id = ResourceId::generate();
        let created_event = Event::for_resource(
            resource_id.clone(),
            et::RESOURCE_CREATED,
            now,
            actor.clone(),
            json!({"name": name, "max_holders": cfg.max_holders, "ttl_seconds": cfg.ttl_seconds, "description": cfg.description}),
        );
        snap = apply_resource(None, &created_event).map_err(apply_err)?;
        persist(layout, &resource_id, name, &created_event, snap.clone())?;
        snap
    };
    let resource_id = ResourceId::new(snap.id.clone());

    let expired: Vec<Actor> = snap.holders.iter().filter(|h| h.expires_at < now).map(|h| h.actor.clone()).collect();
    for holder in &expired {
        let event = Event::for_resource(resource_id.clone(), et::RESOURCE_EXPIRED, now, actor.clone(), json!({"actor": holder}));
        snap = apply_resource(Some(snap), &event).map_err(apply_err)?;
        snap = persist(layout, &resource_id, name, &event, snap)?;
    }

    if snap.holders.iter().any(|h| h.actor.resume_key() == actor.resume_key()) {
        let event = Event::for_resource(resource_id.clone(), et::RESOURCE_HEARTBEAT, now, actor.clone(), json!({"actor": actor, "ttl_seconds": snap.ttl_seconds}));
        snap = apply_resource(Some(snap), &event).map_err(apply_err)?;
        snap = persist(layout, &resource_id, name, &event, snap)?;
        return Ok(AcquireOutcome::Acquired(snap));
    }

    if force && !snap.holders.is_empty() {
        let to_evict: Vec<Actor> = snap.holders.iter().map(|h| h.actor.clone()).collect();
        for holder in &to_evict {
            let event = Event::for_resource(resource_id.clone(), et::RESOURCE_EXPIRED, now, actor.clone(), json!({"actor": holder}));
            snap = apply_resource(Some(snap), &event).map_err(apply_err)?;
            snap = persist(layout, &resource_id, name, &event, snap)?;
        }
    }

    if (snap.holders.len() as u32) < snap.max_holders {
        let event = Event::for_resource(
            resource_id.clone(),
            et::RESOURCE_ACQUIRED,
            now,
            actor.clone(),
            json!({"actor": actor, "task_id": task_id, "ttl_seconds": snap.ttl_seconds}),
        );
        snap = apply_resource(Some(snap), &event).map_err(apply_err)?;
        snap = persist(layout, &resource_id, name, &event, snap)?;
        return Ok(AcquireOutcome::Acquired(snap));
    }

    Ok(AcquireOutcome::WouldBlock)
}

/// `acquire(name, actor, task_id?, force?, wait?, timeout?)` (spec.md §4.6).
///
/// Each poll iteration re-acquires the `resources_<name>` lock fresh (the
/// lock is released between iterations while waiting, per the spec's
/// "release the lock, sleep, loop" step 6).
#[allow(clippy::too_many_arguments)]
pub fn acquire(
    layout: &LatticeLayout,
    name: &str,
    actor: &Actor,
    task_id: Option<&str>,
    force: bool,
    wait: bool,
    wait_timeout: Duration,
    config: Option<&lattice_core::config::ResourceConfigEntry>,
    lock_timeout: Duration,
    now_fn: impl Fn() -> chrono::DateTime<chrono::Utc>,
) -> LatticeResult<ResourceSnapshot> {
    let deadline = std::time::Instant::now() + wait_timeout;
    let mut backoff = POLL_START;
    loop {
        let outcome = {
            let _guard = lattice_lock::acquire(&layout.locks_dir(), &resources_key(name), lock_timeout).map_err(lock_err)?;
            try_acquire_once(layout, name, actor, task_id, force, config, now_fn())?
        };
        match outcome {
            AcquireOutcome::Acquired(snap) => return Ok(snap),
            AcquireOutcome::WouldBlock => {
                if !wait {
                    return Err(LatticeError::ResourceHeld { name: name.to_string() });
                }
                if std::time::Instant::now() >= deadline {
                    return Err(LatticeError::Timeout(wait_timeout));
                }
                std::thread::sleep(backoff.min(deadline.saturating_duration_since(std::time::Instant::now())));
                backoff = (backoff * 2).min(POLL_CAP);
            }
        }
    }
}

/// `release(name, actor)` — fails `NOT_HELD` if the actor isn't a current
/// holder.
pub fn release(layout: &LatticeLayout, name: &str, actor: &Actor, now: chrono::DateTime<chrono::Utc>, lock_timeout: Duration) -> LatticeResult<ResourceSnapshot> {
    let _guard = lattice_lock::acquire(&layout.locks_dir(), &resources_key(name), lock_timeout).map_err(lock_err)?;
    let Some(snap) = load_snapshot(layout, name)? else {
        return Err(LatticeError::NotFound { kind: "resource", id: name.to_string() });
    };
    if !snap.holders.iter().any(|h| h.actor.resume_key() == actor.resume_key()) {
        return Err(LatticeError::NotHeld { name: name.to_string() });
    }
    let resource_id = ResourceId::new(snap.id.clone());
    let event = Event::for_resource(resource_id.clone(), et::RESOURCE_RELEASED, now, actor.clone(), json!({"actor": actor}));
    let snap = apply_resource(Some(snap), &event).map_err(apply_err)?;
    persist(layout, &resource_id, name, &event, snap)
}

/// `heartbeat(name, actor)` — extends the lease; fails `EXPIRED` if the
/// holder's lease has already lapsed, `NOT_HELD` if not held at all.
pub fn heartbeat(layout: &LatticeLayout, name: &str, actor: &Actor, now: chrono::DateTime<chrono::Utc>, lock_timeout: Duration) -> LatticeResult<ResourceSnapshot> {
    let _guard = lattice_lock::acquire(&layout.locks_dir(), &resources_key(name), lock_timeout).map_err(lock_err)?;
    let Some(snap) = load_snapshot(layout, name)? else {
        return Err(LatticeError::NotFound { kind: "resource", id: name.to_string() });
    };
    let Some(holder) = snap.holders.iter().find(|h| h.actor.resume_key() == actor.resume_key()) else {
        return Err(LatticeError::NotHeld { name: name.to_string() });
    };
    if holder.expires_at < now {
        return Err(LatticeError::Expired { name: name.to_string() });
    }
    let resource_id = ResourceId::new(snap.id.clone());
    let event = Event::for_resource(resource_id.clone(), et::RESOURCE_HEARTBEAT, now, actor.clone(), json!({"actor": actor, "ttl_seconds": snap.ttl_seconds}));
    let snap = apply_resource(Some(snap), &event).map_err(apply_err)?;
    persist(layout, &resource_id, name, &event, snap)
}

/// `status(name?)` — read-only, filters expired holders from the view
/// without emitting `resource_expired` events (that's acquire's job).
pub fn status(layout: &LatticeLayout, name: &str, now: chrono::DateTime<chrono::Utc>) -> LatticeResult<Option<ResourceSnapshot>> {
    let Some(mut snap) = load_snapshot(layout, name)? else { return Ok(None) };
    snap.holders.retain(|h| h.expires_at >= now);
    Ok(Some(snap))
}

pub fn list(layout: &LatticeLayout) -> LatticeResult<Vec<String>> {
    let dir = layout.resources_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(|source| fs_err(lattice_fs::FsError::Io { path: dir.clone(), source }))? {
        let entry = entry.map_err(|source| fs_err(lattice_fs::FsError::Io { path: dir.clone(), source }))?;
        if entry.path().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;

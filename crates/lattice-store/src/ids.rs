// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Short-ID allocation (spec.md §4.5): `PROJECT[-SUB]-N`, monotonic per
//! prefix, backed by `ids.json` (schema_version 2).

use crate::convert::{fs_err, lock_err};
use lattice_core::{id::parse_short_id, LatticeResult, TaskId};
use lattice_fs::{atomic_write_json, read_json_opt, LatticeLayout};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const IDS_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdsIndex {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub next_seqs: BTreeMap<String, u64>,
    #[serde(default)]
    pub map: BTreeMap<String, String>,
}

fn default_schema_version() -> u32 {
    IDS_SCHEMA_VERSION
}

pub(crate) fn load(layout: &LatticeLayout) -> LatticeResult<IdsIndex> {
    Ok(read_json_opt(&layout.ids_path()).map_err(fs_err)?.unwrap_or_default())
}

/// Allocate the next short ID for `prefix`, pointing it at `task_ulid`
/// (spec.md §4.5). Caller must already hold the `ids` lock key; this
/// function acquires it itself for standalone use.
pub fn allocate(layout: &LatticeLayout, prefix: &str, task_ulid: &TaskId, lock_timeout: Duration) -> LatticeResult<(String, u64)> {
    let _guard = lattice_lock::acquire(&layout.locks_dir(), crate::locks::IDS_KEY, lock_timeout).map_err(lock_err)?;
    let mut index = load(layout)?;
    let n = *index.next_seqs.get(prefix).unwrap_or(&1);
    let short_id = format!("{prefix}-{n}");
    index.map.insert(short_id.clone(), task_ulid.to_string());
    index.next_seqs.insert(prefix.to_string(), n + 1);
    atomic_write_json(&layout.ids_path(), &index).map_err(fs_err)?;
    Ok((short_id, n))
}

/// Resolve a short ID or a bare ULID-shaped task ID to its canonical `task_`
/// identifier. Inputs already matching the `task_` ULID shape pass through
/// unresolved (spec.md §4.5).
pub fn resolve(layout: &LatticeLayout, short_id_or_ulid: &str) -> LatticeResult<Option<TaskId>> {
    if TaskId::is_well_formed(short_id_or_ulid) {
        return Ok(Some(TaskId::new(short_id_or_ulid)));
    }
    let index = load(layout)?;
    Ok(index.map.get(short_id_or_ulid).map(|ulid| TaskId::new(ulid.clone())))
}

/// Rebuild `ids.json` from the short IDs recorded on `snapshots` (active and
/// archived). Deterministic given the snapshot set (spec.md §4.5).
pub fn rebuild_from_snapshots<'a>(snapshots: impl IntoIterator<Item = (&'a str, &'a str)>) -> IdsIndex {
    let mut map = BTreeMap::new();
    let mut max_seq: BTreeMap<String, u64> = BTreeMap::new();

    for (short_id, task_ulid) in snapshots {
        map.insert(short_id.to_string(), task_ulid.to_string());
        if let Some((prefix, n)) = parse_short_id(short_id) {
            max_seq.entry(prefix).and_modify(|m| *m = (*m).max(n)).or_insert(n);
        }
    }

    let next_seqs = max_seq.into_iter().map(|(prefix, max)| (prefix, max + 1)).collect();
    IdsIndex { schema_version: IDS_SCHEMA_VERSION, next_seqs, map }
}

pub fn write_index(layout: &LatticeLayout, index: &IdsIndex) -> LatticeResult<()> {
    atomic_write_json(&layout.ids_path(), index).map_err(fs_err)
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;

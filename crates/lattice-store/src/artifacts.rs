// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact payload storage for `artifact_attached` (spec.md §4.2, §6.2
//! `attach`): `artifacts/meta/<art_id>.json` alongside
//! `artifacts/payload/<art_id>.<ext>`.
//!
//! Each artifact ID is a freshly minted ULID, so writing its meta/payload
//! pair needs no lock: nothing else on disk can already claim that ID.

use crate::convert::fs_err;
use lattice_core::{Actor, ArtifactId, LatticeResult, TaskId};
use lattice_fs::{atomic_write, atomic_write_json, read_json, LatticeLayout};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// On-disk shape of `artifacts/meta/<art_id>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub id: ArtifactId,
    pub task_id: TaskId,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size_bytes: u64,
    pub sha256: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub created_by: Actor,
}

fn default_schema_version() -> u32 {
    ARTIFACT_SCHEMA_VERSION
}

fn payload_extension(filename: &str) -> &str {
    std::path::Path::new(filename).extension().and_then(|e| e.to_str()).unwrap_or("bin")
}

/// Hash and persist `content` under a freshly minted artifact ID, writing
/// both the payload file and its metadata sidecar. Does not touch the task
/// log or snapshot; the caller emits `artifact_attached` separately so the
/// event batch can also include a role and carry the usual lock set.
pub fn store_artifact(
    layout: &LatticeLayout,
    task_id: &TaskId,
    filename: &str,
    content_type: Option<&str>,
    content: &[u8],
    actor: &Actor,
    now: chrono::DateTime<chrono::Utc>,
) -> LatticeResult<ArtifactMeta> {
    let artifact_id = ArtifactId::generate();
    let digest = Sha256::digest(content);
    let sha256 = format!("{digest:x}");

    let payload_path = layout.artifacts_payload_dir().join(format!("{artifact_id}.{}", payload_extension(filename)));
    atomic_write(&payload_path, content).map_err(fs_err)?;

    let meta = ArtifactMeta {
        schema_version: ARTIFACT_SCHEMA_VERSION,
        id: artifact_id.clone(),
        task_id: task_id.clone(),
        filename: filename.to_string(),
        content_type: content_type.map(str::to_string),
        size_bytes: content.len() as u64,
        sha256,
        created_at: now,
        created_by: actor.clone(),
    };
    atomic_write_json(&layout.artifact_meta_path(&artifact_id), &meta).map_err(fs_err)?;

    Ok(meta)
}

pub fn load_artifact_meta(layout: &LatticeLayout, artifact_id: &ArtifactId) -> LatticeResult<ArtifactMeta> {
    read_json(&layout.artifact_meta_path(artifact_id)).map_err(fs_err)
}

#[cfg(test)]
#[path = "artifacts_tests.rs"]
mod tests;

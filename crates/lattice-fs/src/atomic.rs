// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic JSON write primitive (spec.md §4.2).
//!
//! Write to `<path>.tmp-<random>`, fsync the file, rename into place,
//! best-effort fsync the parent directory. Readers see either the previous
//! content or the complete new content, never a partial write.

use crate::error::{FsError, FsResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write `contents` atomically to `path`, creating parent directories as
/// needed.
pub fn atomic_write(path: &Path, contents: &[u8]) -> FsResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|source| FsError::Io { path: parent.to_path_buf(), source })?;

    let tmp_path = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("tmp"),
        tmp_suffix(),
    ));

    let mut tmp_file =
        File::create(&tmp_path).map_err(|source| FsError::Io { path: tmp_path.clone(), source })?;
    tmp_file
        .write_all(contents)
        .map_err(|source| FsError::Io { path: tmp_path.clone(), source })?;
    tmp_file
        .sync_all()
        .map_err(|source| FsError::Io { path: tmp_path.clone(), source })?;
    drop(tmp_file);

    std::fs::rename(&tmp_path, path).map_err(|source| FsError::Io { path: path.to_path_buf(), source })?;

    // Directory fsync is best-effort: not all platforms support opening a
    // directory for reading, and losing durability of the rename's metadata
    // (not its content) is recoverable by the audit/rebuild pipeline.
    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }

    Ok(())
}

/// Serialize `value` to canonical JSON (via its own `to_canonical_json`-style
/// caller) and write it atomically. Callers that need sorted-key canonical
/// output should pre-serialize; this helper is for types where
/// `serde_json::to_vec_pretty` is sufficient (e.g. `config.json`, `ids.json`).
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> FsResult<()> {
    let mut bytes =
        serde_json::to_vec_pretty(value).map_err(|source| FsError::Json { path: path.to_path_buf(), source })?;
    bytes.push(b'\n');
    atomic_write(path, &bytes)
}

/// Write pre-serialized canonical JSON text (already newline-terminated).
pub fn atomic_write_str(path: &Path, text: &str) -> FsResult<()> {
    atomic_write(path, text.as_bytes())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> FsResult<T> {
    let bytes = std::fs::read(path).map_err(|source| FsError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_slice(&bytes).map_err(|source| FsError::Json { path: path.to_path_buf(), source })
}

pub fn read_json_opt<T: DeserializeOwned>(path: &Path) -> FsResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    read_json(path).map(Some)
}

fn tmp_suffix() -> String {
    // A process-unique, collision-resistant suffix without reading the
    // wall clock twice per write: PID plus an incrementing counter.
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", std::process::id(), n)
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;

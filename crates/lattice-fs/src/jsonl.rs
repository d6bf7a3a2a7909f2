// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task/resource JSONL event log append and tolerant read (spec.md
//! §4.2).
//!
//! Appends write `"<serialized event>\n"` in a single `write_all` call. On
//! read, a trailing line that doesn't end in `\n` and doesn't parse is a
//! *truncated final line* (warning, recoverable); any other unparseable
//! line, or a trailing line that fails to parse despite being newline
//! terminated, is mid-file corruption (a harder error).

use crate::error::{FsError, FsResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Append a single already-serialized line (without trailing newline) to
/// `path`, creating the file and parent directories if needed.
pub fn append_line(path: &Path, line: &str) -> FsResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| FsError::Io { path: parent.to_path_buf(), source })?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| FsError::Io { path: path.to_path_buf(), source })?;
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');
    file.write_all(buf.as_bytes())
        .map_err(|source| FsError::Io { path: path.to_path_buf(), source })?;
    file.sync_all().map_err(|source| FsError::Io { path: path.to_path_buf(), source })?;
    Ok(())
}

/// Append `value` serialized as canonical single-line JSON.
pub fn append_json_line<T: Serialize>(path: &Path, value: &T) -> FsResult<()> {
    let line = serde_json::to_string(value).map_err(|source| FsError::Json { path: path.to_path_buf(), source })?;
    append_line(path, &line)
}

/// Outcome of a tolerant JSONL read: the successfully parsed records, plus
/// whether the file ended in a truncated (newline-less, unparseable) final
/// line.
#[derive(Debug)]
pub struct JsonlRead<T> {
    pub records: Vec<T>,
    pub truncated_tail: bool,
}

/// Read every record in `path`. Returns `Ok(JsonlRead { records: vec![], .. })`
/// if the file does not exist.
///
/// A trailing unparseable line is treated as a truncated write only when the
/// raw file bytes do not end with `\n` (the unambiguous signature of a crash
/// mid-`write_all`). Any other parse failure -- including an unparseable
/// line that *is* newline-terminated, or a failure anywhere but the last
/// line -- is reported as [`FsError::Corrupt`].
pub fn read_jsonl_tolerant<T: DeserializeOwned>(path: &Path) -> FsResult<JsonlRead<T>> {
    if !path.exists() {
        return Ok(JsonlRead { records: Vec::new(), truncated_tail: false });
    }
    let bytes = std::fs::read(path).map_err(|source| FsError::Io { path: path.to_path_buf(), source })?;
    let ends_with_newline = bytes.last() == Some(&b'\n');
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.split('\n').collect();
    // split('\n') on a newline-terminated string yields one trailing empty
    // element; drop it so `lines` is exactly the logical line count.
    let lines: &[&str] = if ends_with_newline {
        &lines[..lines.len().saturating_sub(1)]
    } else {
        &lines[..]
    };

    let mut records = Vec::with_capacity(lines.len());
    let mut truncated_tail = false;

    for (idx, raw_line) in lines.iter().enumerate() {
        if raw_line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(raw_line) {
            Ok(record) => records.push(record),
            Err(err) => {
                let is_last = idx == lines.len() - 1;
                if is_last && !ends_with_newline {
                    truncated_tail = true;
                } else {
                    return Err(FsError::Corrupt {
                        path: path.to_path_buf(),
                        line: idx + 1,
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    Ok(JsonlRead { records, truncated_tail })
}

/// Rewrite `path` with its trailing truncated line (if any) stripped, used
/// by `doctor --fix` (spec.md §4.9).
pub fn strip_truncated_tail<T: DeserializeOwned + Serialize>(path: &Path) -> FsResult<bool> {
    let JsonlRead { records, truncated_tail } = read_jsonl_tolerant::<T>(path)?;
    if !truncated_tail {
        return Ok(false);
    }
    let mut buf = String::new();
    for record in &records {
        buf.push_str(&serde_json::to_string(record).map_err(|source| FsError::Json { path: path.to_path_buf(), source })?);
        buf.push('\n');
    }
    crate::atomic::atomic_write_str(path, &buf)?;
    Ok(true)
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;

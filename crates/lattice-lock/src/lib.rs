// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Multi-key advisory file locking with deadlock-free sorted acquisition
//! (spec.md §4.3).
//!
//! Not a distributed lock: it coordinates multiple processes on a single
//! host sharing one project directory, via OS advisory locks (`fs2`) on
//! lockfiles under `.lattice/locks/`.

pub mod error;

pub use error::{LockError, LockResult};

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Default timeout for the storage write pipeline (spec.md §4.4).
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_START: Duration = Duration::from_millis(5);
const POLL_CAP: Duration = Duration::from_millis(50);

/// A held advisory lock on one key. Released when dropped.
pub struct LockHandle {
    key: String,
    file: File,
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

/// A set of locks acquired together in sorted order. Dropping the guard
/// releases every held lock (in any order; release order does not matter
/// for correctness since acquisition order is what prevents deadlock).
pub struct LockGuard {
    handles: Vec<LockHandle>,
}

impl LockGuard {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.handles.iter().map(|h| h.key.as_str())
    }
}

/// Acquire a single advisory lock on `<locks_dir>/<key>.lock`.
pub fn acquire(locks_dir: &Path, key: &str, timeout: Duration) -> LockResult<LockGuard> {
    acquire_many(locks_dir, &[key], timeout)
}

/// Acquire advisory locks on every key in `keys`, sorted lexicographically
/// first. Sorting is the sole deadlock-prevention mechanism: every
/// multi-lock caller must go through this function (spec.md §4.3).
pub fn acquire_many(locks_dir: &Path, keys: &[&str], timeout: Duration) -> LockResult<LockGuard> {
    let mut sorted: Vec<&str> = keys.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let deadline = Instant::now() + timeout;
    let mut handles = Vec::with_capacity(sorted.len());

    for key in sorted {
        let handle = acquire_one(locks_dir, key, deadline)?;
        handles.push(handle);
    }

    Ok(LockGuard { handles })
}

fn lock_path(locks_dir: &Path, key: &str) -> PathBuf {
    locks_dir.join(format!("{key}.lock"))
}

fn acquire_one(locks_dir: &Path, key: &str, deadline: Instant) -> LockResult<LockHandle> {
    std::fs::create_dir_all(locks_dir)
        .map_err(|source| LockError::Io { key: key.to_string(), source })?;
    let path = lock_path(locks_dir, key);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&path)
        .map_err(|source| LockError::Io { key: key.to_string(), source })?;

    let mut backoff = POLL_START;
    loop {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(LockHandle { key: key.to_string(), file }),
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Err(LockError::Timeout {
                        key: key.to_string(),
                        timeout: deadline.saturating_duration_since(Instant::now()),
                    });
                }
                std::thread::sleep(backoff.min(deadline.saturating_duration_since(Instant::now())));
                backoff = (backoff * 2).min(POLL_CAP);
            }
            Err(source) => return Err(LockError::Io { key: key.to_string(), source }),
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

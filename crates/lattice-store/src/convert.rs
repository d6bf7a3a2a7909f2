// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps the lower-layer error types (`lattice-fs`, `lattice-lock`,
//! `lattice-materialize`) onto the shared [`LatticeError`] taxonomy of
//! spec.md §7 at the `lattice-store` boundary.

use lattice_core::LatticeError;
use lattice_fs::FsError;
use lattice_lock::LockError;
use lattice_materialize::ApplyError;

pub fn fs_err(e: FsError) -> LatticeError {
    match e {
        FsError::Corrupt { path, line, message } => {
            LatticeError::ReadError(format!("{}: line {line}: {message}", path.display()))
        }
        other => LatticeError::WriteError(other.to_string()),
    }
}

pub fn lock_err(e: LockError) -> LatticeError {
    match e {
        LockError::Timeout { key: _, timeout } => LatticeError::Timeout(timeout),
        other => LatticeError::WriteError(other.to_string()),
    }
}

pub fn apply_err(e: ApplyError) -> LatticeError {
    match e {
        ApplyError::ProtectedField(field) => LatticeError::ProtectedField(field),
        other => LatticeError::Validation(other.to_string()),
    }
}

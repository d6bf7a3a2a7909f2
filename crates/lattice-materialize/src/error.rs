// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors raised by the pure `apply` dispatch (spec.md §4.1).
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("cannot apply event type '{event_type}' without an existing snapshot (expected task_created first)")]
    NoInitialSnapshot { event_type: String },

    #[error("field '{0}' is protected and cannot be updated via field_updated")]
    ProtectedField(String),

    #[error("event data missing required field '{0}' for event type '{1}'")]
    MissingField(&'static str, String),

    #[error("event data field '{field}' had unexpected shape for event type '{event_type}': {message}")]
    MalformedData {
        field: &'static str,
        event_type: String,
        message: String,
    },
}

pub type ApplyResult<T> = Result<T, ApplyError>;

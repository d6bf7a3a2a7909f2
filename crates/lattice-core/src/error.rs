// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The core error taxonomy (spec.md §7).
//!
//! Every fallible core operation returns `Result<T, LatticeError>`. The CLI
//! and dashboard layers map variants to exit codes / HTTP statuses; this
//! crate only defines the taxonomy and the machine-readable `code()` used in
//! JSON-mode envelopes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LatticeError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("invalid actor: {0}")]
    InvalidActor(String),

    #[error("invalid role '{role}': valid roles are {valid:?}")]
    InvalidRole { role: String, valid: Vec<String> },

    #[error("invalid transition from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("completion blocked: {0}")]
    CompletionBlocked(String),

    #[error("field '{0}' is protected and cannot be updated via field_updated")]
    ProtectedField(String),

    #[error("resource '{name}' is held at capacity")]
    ResourceHeld { name: String },

    #[error("actor does not hold resource '{name}'")]
    NotHeld { name: String },

    #[error("lease on '{name}' has expired")]
    Expired { name: String },

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("task already claimed by {owner}")]
    AlreadyClaimed { owner: String },

    #[error("a worker is already running for this task")]
    AlreadyRunning,

    #[error("a plan is required before claiming this task")]
    PlanRequired,

    #[error("write error: {0}")]
    WriteError(String),

    #[error("read error: {0}")]
    ReadError(String),

    #[error("bind error: {0}")]
    BindError(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LatticeError {
    /// The stable machine-readable code surfaced in JSON-mode error
    /// envelopes (spec.md §6.3, §7).
    pub fn code(&self) -> &'static str {
        match self {
            LatticeError::NotFound { .. } => "NOT_FOUND",
            LatticeError::InvalidId(_) => "INVALID_ID",
            LatticeError::InvalidActor(_) => "INVALID_ACTOR",
            LatticeError::InvalidRole { .. } => "INVALID_ROLE",
            LatticeError::InvalidTransition { .. } => "INVALID_TRANSITION",
            LatticeError::Validation(_) => "VALIDATION_ERROR",
            LatticeError::Conflict(_) => "CONFLICT",
            LatticeError::CompletionBlocked(_) => "COMPLETION_BLOCKED",
            LatticeError::ProtectedField(_) => "PROTECTED_FIELD",
            LatticeError::ResourceHeld { .. } => "RESOURCE_HELD",
            LatticeError::NotHeld { .. } => "NOT_HELD",
            LatticeError::Expired { .. } => "EXPIRED",
            LatticeError::Timeout(_) => "TIMEOUT",
            LatticeError::AlreadyClaimed { .. } => "ALREADY_CLAIMED",
            LatticeError::AlreadyRunning => "ALREADY_RUNNING",
            LatticeError::PlanRequired => "PLAN_REQUIRED",
            LatticeError::WriteError(_) => "WRITE_ERROR",
            LatticeError::ReadError(_) => "READ_ERROR",
            LatticeError::BindError(_) => "BIND_ERROR",
            LatticeError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            LatticeError::BadRequest(_) => "BAD_REQUEST",
            LatticeError::Forbidden(_) => "FORBIDDEN",
            LatticeError::Io(_) => "WRITE_ERROR",
            LatticeError::Json(_) => "READ_ERROR",
        }
    }

    /// Exit code per spec.md §6.3: 1 for user/validation errors, 2 for
    /// system errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            LatticeError::Io(_) | LatticeError::BindError(_) => 2,
            _ => 1,
        }
    }
}

pub type LatticeResult<T> = Result<T, LatticeError>;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Actor identity: who performed an event.
//!
//! Mirrors the tagged-union pattern used for ownership elsewhere in this
//! line of codebases (a `{type, ...}`-shaped enum distinguishing two
//! representations of "who"), generalized to a two-shape union: the legacy
//! flat string and a structured named-session object.

use serde::{Deserialize, Serialize};

/// Actor prefixes recognized in the legacy `prefix:identifier` string shape.
pub const LEGACY_PREFIXES: &[&str] = &["human", "agent", "team", "system", "dashboard"];

/// Who performed an event.
///
/// Serializes as a bare string for the legacy shape (`"agent:alpha"`) or as
/// an object for the structured shape (`{"name": ..., "base_name": ...,
/// "serial": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Actor {
    /// `prefix:identifier`, prefix one of [`LEGACY_PREFIXES`].
    Legacy(String),
    /// A named session, e.g. a specific agent worktree instance.
    Structured {
        name: String,
        base_name: String,
        serial: u32,
    },
}

impl Actor {
    pub fn legacy(prefix: &str, identifier: &str) -> Self {
        Actor::Legacy(format!("{prefix}:{identifier}"))
    }

    /// The key used for resume-first equality (spec.md §4.8 / §9):
    /// structured actors compare by `name`, legacy actors by exact string.
    pub fn resume_key(&self) -> &str {
        match self {
            Actor::Legacy(s) => s,
            Actor::Structured { name, .. } => name,
        }
    }

    /// Validate the legacy `prefix:identifier` shape. Structured actors are
    /// always considered well-formed (their shape is enforced by the type).
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Actor::Legacy(s) => {
                let Some((prefix, identifier)) = s.split_once(':') else {
                    return Err(format!("actor '{s}' is missing a 'prefix:identifier' colon"));
                };
                if identifier.is_empty() {
                    return Err(format!("actor '{s}' has an empty identifier"));
                }
                if !LEGACY_PREFIXES.contains(&prefix) {
                    return Err(format!(
                        "actor prefix '{prefix}' is not one of {LEGACY_PREFIXES:?}"
                    ));
                }
                Ok(())
            }
            Actor::Structured { name, base_name, .. } => {
                if name.is_empty() || base_name.is_empty() {
                    return Err("structured actor name/base_name must be non-empty".to_string());
                }
                Ok(())
            }
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Legacy(s) => write!(f, "{s}"),
            Actor::Structured { name, .. } => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
#[path = "actor_tests.rs"]
mod tests;

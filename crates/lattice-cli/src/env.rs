// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable overrides for event attribution (spec.md §6.4):
//! `LATTICE_ACTOR`, `LATTICE_MODEL`, `LATTICE_SESSION`.

use anyhow::{anyhow, Result};
use lattice_core::{Actor, Config};
use std::time::Duration;

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolve the acting actor: `--actor` flag > `LATTICE_ACTOR` env >
/// `config.default_actor` > error.
pub fn resolve_actor(flag: Option<&str>, config: &Config) -> Result<Actor> {
    let raw = flag
        .map(str::to_string)
        .or_else(|| std::env::var("LATTICE_ACTOR").ok().filter(|s| !s.is_empty()))
        .or_else(|| config.default_actor.clone())
        .ok_or_else(|| anyhow!("no actor: pass --actor, set LATTICE_ACTOR, or configure default_actor"))?;

    if let Some((prefix, id)) = raw.split_once(':') {
        if lattice_core::LEGACY_PREFIXES.contains(&prefix) {
            let actor = Actor::legacy(prefix, id);
            actor.validate().map_err(|e| anyhow!(e))?;
            return Ok(actor);
        }
    }
    Err(anyhow!("actor '{raw}' is not a valid 'prefix:identifier' string"))
}

pub fn resolve_model(flag: Option<&str>) -> Option<String> {
    flag.map(str::to_string).or_else(|| std::env::var("LATTICE_MODEL").ok().filter(|s| !s.is_empty()))
}

pub fn resolve_session(flag: Option<&str>) -> Option<String> {
    flag.map(str::to_string).or_else(|| std::env::var("LATTICE_SESSION").ok().filter(|s| !s.is_empty()))
}

pub fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

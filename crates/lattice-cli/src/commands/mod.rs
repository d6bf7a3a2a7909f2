// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod config;
pub mod init;
pub mod integrity;
pub mod query;
pub mod resource;
pub mod task;

use crate::output::OutputFormat;
use anyhow::{anyhow, Result};
use lattice_core::{Actor, Config, TaskId, WorkflowConfig};
use lattice_fs::LatticeLayout;
use std::time::Duration;

/// Everything a command handler needs: where the project lives, its current
/// config, who is acting, when, how long to wait on a lock, and how to
/// render the result. Built once in `main` and threaded through by
/// reference so no handler re-derives any of it.
pub struct Ctx {
    pub layout: LatticeLayout,
    pub config: Config,
    pub actor: Actor,
    pub now: chrono::DateTime<chrono::Utc>,
    pub lock_timeout: Duration,
    pub format: OutputFormat,
}

impl Ctx {
    pub fn workflow(&self) -> &WorkflowConfig {
        &self.config.workflow
    }

    pub fn resolve_task_id(&self, raw: &str) -> Result<TaskId> {
        lattice_store::ids::resolve(&self.layout, raw)?.ok_or_else(|| anyhow!("no task matches '{raw}'"))
    }
}

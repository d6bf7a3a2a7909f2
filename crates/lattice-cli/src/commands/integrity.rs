// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integrity subcommands (spec.md §6.2 "Integrity", §4.9): `doctor` audits,
//! `fix` repairs truncated tails and rebuilds `ids.json`, `rebuild` replays
//! one task or every task/resource from its event log.

use super::Ctx;
use crate::output::finish;
use anyhow::Result;
use clap::Args;
use lattice_store::{doctor, fix, rebuild_all, rebuild_task};

#[derive(Args, Debug)]
pub struct DoctorArgs;

pub fn handle_doctor(ctx: &Ctx, _args: DoctorArgs) -> Result<i32> {
    let result = doctor(&ctx.layout, &ctx.config, ctx.now);
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct FixArgs {
    /// Also rebuild every task/resource snapshot from its event log.
    #[arg(long)]
    pub rebuild_snapshots: bool,
}

pub fn handle_fix(ctx: &Ctx, args: FixArgs) -> Result<i32> {
    let result = fix(&ctx.layout, ctx.lock_timeout, args.rebuild_snapshots);
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct RebuildArgs {
    /// Rebuild only this task; omit to rebuild every task, resource and `ids.json`.
    pub task_id: Option<String>,
}

pub fn handle_rebuild(ctx: &Ctx, args: RebuildArgs) -> Result<i32> {
    match args.task_id {
        Some(raw) => {
            let task_id = ctx.resolve_task_id(&raw)?;
            let result = rebuild_task(&ctx.layout, &task_id, ctx.lock_timeout);
            Ok(finish(ctx.format, result))
        }
        None => {
            let result = rebuild_all(&ctx.layout, ctx.lock_timeout);
            Ok(finish(ctx.format, result))
        }
    }
}

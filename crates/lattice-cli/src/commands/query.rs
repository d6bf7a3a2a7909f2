// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only subcommands (spec.md §6.2 "Query").

use super::Ctx;
use crate::output::{finish, print_ids};
use anyhow::Result;
use clap::Args;
use lattice_store::ops::{self, ListFilter};

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub assigned: Option<String>,
    #[arg(long)]
    pub tag: Option<String>,
    #[arg(long = "type")]
    pub task_type: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub include_archived: bool,
}

pub fn list(ctx: &Ctx, args: ListArgs) -> Result<i32> {
    let filter = ListFilter {
        status: args.status.as_deref(),
        assigned: args.assigned.as_deref(),
        tag: args.tag.as_deref(),
        task_type: args.task_type.as_deref(),
        priority: args.priority.as_deref(),
        include_archived: args.include_archived,
    };
    let snapshots = ops::list(&ctx.layout, &filter)?;
    if ctx.format == crate::output::OutputFormat::Quiet {
        let ids: Vec<String> = snapshots.iter().map(|s| s.short_id.clone().unwrap_or_else(|| s.id.to_string())).collect();
        return Ok(print_ids(ctx.format, &ids));
    }
    Ok(finish(ctx.format, Ok::<_, lattice_core::LatticeError>(snapshots)))
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub task_id: String,
}

pub fn show(ctx: &Ctx, args: ShowArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let result = ops::show(&ctx.layout, &task_id);
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct EventsArgs {
    pub task_id: String,
}

pub fn events(ctx: &Ctx, args: EventsArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let result = ops::events(&ctx.layout, &task_id);
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    pub task_id: String,
}

pub fn plan(ctx: &Ctx, args: PlanArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let result = ops::plan(&ctx.layout, &task_id);
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct NextArgs {
    /// Restrict the ready pool to these statuses (default: backlog, planned).
    #[arg(long, value_delimiter = ',')]
    pub ready_status: Option<Vec<String>>,
    /// Claim the selected task: walk it to `in_progress` as one transaction.
    #[arg(long)]
    pub claim: bool,
}

pub fn next(ctx: &Ctx, args: NextArgs) -> Result<i32> {
    let ready: Option<Vec<&str>> = args.ready_status.as_ref().map(|v| v.iter().map(String::as_str).collect());
    let ready_refs = ready.as_deref();
    let result = if args.claim {
        ops::claim_next(&ctx.layout, &ctx.actor, ready_refs, ctx.workflow(), ctx.now, ctx.lock_timeout)
    } else {
        ops::next(&ctx.layout, Some(&ctx.actor), ready_refs)
    };
    Ok(finish(ctx.format, result))
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource coordination subcommands (spec.md §6.2 "Resource", §4.6).

use super::Ctx;
use crate::output::{finish, print_ids};
use anyhow::Result;
use clap::{Args, Subcommand};
use lattice_store::resources;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct ResourceArgs {
    #[command(subcommand)]
    pub command: ResourceCommand,
}

#[derive(Subcommand, Debug)]
pub enum ResourceCommand {
    Create {
        name: String,
        #[arg(long, default_value_t = 1)]
        max_holders: u32,
        #[arg(long)]
        ttl_seconds: u64,
        #[arg(long)]
        description: Option<String>,
    },
    Acquire {
        name: String,
        #[arg(long)]
        task_id: Option<String>,
        /// Evict current holders instead of waiting/failing.
        #[arg(long)]
        force: bool,
        /// Block (with exponential backoff) until acquired or `--timeout` elapses.
        #[arg(long)]
        wait: bool,
        #[arg(long, default_value_t = 30)]
        timeout_seconds: u64,
    },
    Release { name: String },
    Heartbeat { name: String },
    Status { name: String },
    List,
}

pub fn handle(ctx: &Ctx, args: ResourceArgs) -> Result<i32> {
    match args.command {
        ResourceCommand::Create { name, max_holders, ttl_seconds, description } => {
            let result = resources::create(&ctx.layout, &name, max_holders, ttl_seconds, description.as_deref(), &ctx.actor, ctx.now, ctx.lock_timeout);
            Ok(finish(ctx.format, result))
        }
        ResourceCommand::Acquire { name, task_id, force, wait, timeout_seconds } => {
            let resource_config = ctx.config.resources.as_ref().and_then(|m| m.get(&name));
            let result = resources::acquire(
                &ctx.layout,
                &name,
                &ctx.actor,
                task_id.as_deref(),
                force,
                wait,
                Duration::from_secs(timeout_seconds),
                resource_config,
                ctx.lock_timeout,
                crate::env::now,
            );
            Ok(finish(ctx.format, result))
        }
        ResourceCommand::Release { name } => {
            let result = resources::release(&ctx.layout, &name, &ctx.actor, ctx.now, ctx.lock_timeout);
            Ok(finish(ctx.format, result))
        }
        ResourceCommand::Heartbeat { name } => {
            let result = resources::heartbeat(&ctx.layout, &name, &ctx.actor, ctx.now, ctx.lock_timeout);
            Ok(finish(ctx.format, result))
        }
        ResourceCommand::Status { name } => {
            let result = resources::status(&ctx.layout, &name, ctx.now);
            Ok(finish(ctx.format, result))
        }
        ResourceCommand::List => {
            let names = resources::list(&ctx.layout)?;
            if ctx.format == crate::output::OutputFormat::Quiet {
                return Ok(print_ids(ctx.format, &names));
            }
            Ok(finish(ctx.format, Ok::<_, lattice_core::LatticeError>(names)))
        }
    }
}

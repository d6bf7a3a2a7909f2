// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration subcommands (spec.md §6.2 "Config").

use super::Ctx;
use crate::output::finish;
use anyhow::Result;
use clap::{Args, Subcommand};
use lattice_store::ops;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Set the `PROJECT` half of short-ID allocation (`PROJECT[-SUB]-N`).
    SetProjectCode { code: String },
    /// Set the `SUB` half of short-ID allocation.
    SetSubprojectCode { code: String },
    /// Print the current config.
    Read,
}

pub fn handle(ctx: &Ctx, args: ConfigArgs) -> Result<i32> {
    let result = match args.command {
        ConfigCommand::SetProjectCode { code } => ops::set_project_code(&ctx.layout, &code, ctx.lock_timeout),
        ConfigCommand::SetSubprojectCode { code } => ops::set_subproject_code(&ctx.layout, &code, ctx.lock_timeout),
        ConfigCommand::Read => ops::read_config(&ctx.layout),
    };
    Ok(finish(ctx.format, result))
}

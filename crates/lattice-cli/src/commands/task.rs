// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task-lifecycle and compound subcommands (spec.md §6.2 "Task lifecycle",
//! "Compound").

use super::Ctx;
use crate::output::finish;
use anyhow::Result;
use clap::{Args, Subcommand};
use lattice_core::TaskId;
use lattice_store::ops::{self, CompleteInput, CreateTaskInput};
use serde_json::Value;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Reuse this ULID (enables idempotent retries); a fresh one is minted otherwise.
    #[arg(long)]
    pub id: Option<String>,
    pub title: String,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long = "type", default_value = "task")]
    pub task_type: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,
    #[arg(long)]
    pub assigned_to: Option<String>,
    #[arg(long)]
    pub urgency: Option<String>,
    #[arg(long)]
    pub complexity: Option<String>,
    /// Raw JSON object merged into `custom_fields`.
    #[arg(long)]
    pub custom_fields: Option<String>,
}

pub fn create(ctx: &Ctx, args: CreateArgs) -> Result<i32> {
    let assigned_to = args.assigned_to.as_deref().map(parse_actor).transpose()?;
    let custom_fields: Value = args.custom_fields.as_deref().map(serde_json::from_str).transpose()?.unwrap_or_else(|| serde_json::json!({}));
    let input = CreateTaskInput {
        id: args.id.map(TaskId::new),
        title: &args.title,
        status: args.status.as_deref(),
        priority: args.priority.as_deref(),
        task_type: &args.task_type,
        description: args.description.as_deref(),
        tags: args.tags.clone(),
        assigned_to,
        urgency: args.urgency.as_deref(),
        complexity: args.complexity.as_deref(),
        custom_fields,
    };
    let result = ops::create(&ctx.layout, &ctx.config, input, &ctx.actor, ctx.now, ctx.lock_timeout);
    Ok(finish(ctx.format, result))
}

fn parse_actor(raw: &str) -> Result<lattice_core::Actor> {
    let (prefix, id) = raw.split_once(':').ok_or_else(|| anyhow::anyhow!("actor '{raw}' must be 'prefix:identifier'"))?;
    let actor = lattice_core::Actor::legacy(prefix, id);
    actor.validate().map_err(anyhow::Error::msg)?;
    Ok(actor)
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub task_id: String,
    pub field: String,
    /// Raw JSON value (string fields should be quoted: `'"some text"'`).
    pub to: String,
}

pub fn update(ctx: &Ctx, args: UpdateArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let to: Value = serde_json::from_str(&args.to).unwrap_or_else(|_| Value::String(args.to.clone()));
    let result = ops::update(&ctx.layout, &task_id, &args.field, to, ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout);
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    pub task_id: String,
    pub to: String,
    /// Bypass transition validation and the completion-policy gate.
    #[arg(long)]
    pub force: bool,
    #[arg(long)]
    pub reason: Option<String>,
}

pub fn status(ctx: &Ctx, args: StatusArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let force_reason = if args.force { Some(args.reason.as_deref().unwrap_or("forced")) } else { None };
    let result = ops::set_status(&ctx.layout, &task_id, &args.to, force_reason, ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout);
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct AssignArgs {
    pub task_id: String,
    /// Omit to unassign.
    pub to: Option<String>,
}

pub fn assign(ctx: &Ctx, args: AssignArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let to = args.to.as_deref().map(parse_actor).transpose()?;
    let result = ops::assign(&ctx.layout, &task_id, to.as_ref(), ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout);
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct CommentArgs {
    #[command(subcommand)]
    pub command: CommentCommand,
}

#[derive(Subcommand, Debug)]
pub enum CommentCommand {
    Add { task_id: String, body: String, #[arg(long)] role: Option<String> },
    Edit { task_id: String, comment_id: String, #[arg(long)] body: Option<String>, #[arg(long)] role: Option<String> },
    Delete { task_id: String, comment_id: String },
    React { task_id: String, comment_id: String, emoji: String },
    Unreact { task_id: String, comment_id: String, emoji: String },
}

pub fn comment(ctx: &Ctx, args: CommentArgs) -> Result<i32> {
    let result = match args.command {
        CommentCommand::Add { task_id, body, role } => {
            let task_id = ctx.resolve_task_id(&task_id)?;
            ops::comment(&ctx.layout, &task_id, &body, role.as_deref(), ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout)
        }
        CommentCommand::Edit { task_id, comment_id, body, role } => {
            let task_id = ctx.resolve_task_id(&task_id)?;
            ops::edit_comment(&ctx.layout, &task_id, &comment_id, body.as_deref(), role.as_deref(), ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout)
        }
        CommentCommand::Delete { task_id, comment_id } => {
            let task_id = ctx.resolve_task_id(&task_id)?;
            ops::delete_comment(&ctx.layout, &task_id, &comment_id, ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout)
        }
        CommentCommand::React { task_id, comment_id, emoji } => {
            let task_id = ctx.resolve_task_id(&task_id)?;
            ops::react(&ctx.layout, &task_id, &comment_id, &emoji, ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout)
        }
        CommentCommand::Unreact { task_id, comment_id, emoji } => {
            let task_id = ctx.resolve_task_id(&task_id)?;
            ops::unreact(&ctx.layout, &task_id, &comment_id, &emoji, ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout)
        }
    };
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    pub task_id: String,
    #[arg(long = "type")]
    pub rel_type: String,
    pub target_task_id: String,
    #[arg(long)]
    pub note: Option<String>,
}

pub fn link(ctx: &Ctx, args: LinkArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let target_id = ctx.resolve_task_id(&args.target_task_id)?;
    let result = ops::link(&ctx.layout, &task_id, &args.rel_type, &target_id, args.note.as_deref(), ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout);
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct UnlinkArgs {
    pub task_id: String,
    #[arg(long = "type")]
    pub rel_type: String,
    pub target_task_id: String,
}

pub fn unlink(ctx: &Ctx, args: UnlinkArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let target_id = ctx.resolve_task_id(&args.target_task_id)?;
    let result = ops::unlink(&ctx.layout, &task_id, &args.rel_type, &target_id, ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout);
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct BranchLinkArgs {
    pub task_id: String,
    pub branch: String,
    #[arg(long)]
    pub repo: Option<String>,
}

pub fn branch_link(ctx: &Ctx, args: BranchLinkArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let result = ops::branch_link(&ctx.layout, &task_id, &args.branch, args.repo.as_deref(), ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout);
    Ok(finish(ctx.format, result))
}

pub fn branch_unlink(ctx: &Ctx, args: BranchLinkArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let result = ops::branch_unlink(&ctx.layout, &task_id, &args.branch, args.repo.as_deref(), ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout);
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct AttachArgs {
    pub task_id: String,
    /// Path to the file to attach; content is read and hashed.
    pub path: std::path::PathBuf,
    #[arg(long)]
    pub content_type: Option<String>,
    #[arg(long)]
    pub role: Option<String>,
}

pub fn attach(ctx: &Ctx, args: AttachArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let content = std::fs::read(&args.path)?;
    let filename = args.path.file_name().and_then(|n| n.to_str()).unwrap_or("artifact").to_string();
    let result = ops::attach(&ctx.layout, &task_id, &filename, args.content_type.as_deref(), args.role.as_deref(), &content, ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout)
        .map(|(snap, meta)| serde_json::json!({"task": snap, "artifact": meta}));
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct ArchiveArgs {
    pub task_id: String,
    #[arg(long)]
    pub reason: Option<String>,
}

pub fn archive(ctx: &Ctx, args: ArchiveArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let result = ops::archive(&ctx.layout, &task_id, ctx.actor.clone(), args.reason.as_deref(), ctx.now, ctx.lock_timeout);
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct UnarchiveArgs {
    pub task_id: String,
}

pub fn unarchive(ctx: &Ctx, args: UnarchiveArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let result = ops::unarchive(&ctx.layout, &task_id, ctx.actor.clone(), ctx.now, ctx.lock_timeout);
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct EventArgs {
    pub task_id: String,
    /// Must start with `x_`.
    pub event_type: String,
    /// Raw JSON object.
    #[arg(default_value = "{}")]
    pub data: String,
}

pub fn custom_event(ctx: &Ctx, args: EventArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let data: Value = serde_json::from_str(&args.data)?;
    let result = ops::custom_event(&ctx.layout, &task_id, &args.event_type, data, ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout);
    Ok(finish(ctx.format, result))
}

#[derive(Args, Debug)]
pub struct CompleteArgs {
    pub task_id: String,
    pub review_comment: String,
    #[arg(long, default_value = "review")]
    pub review_role: String,
    /// Optional review artifact to attach in the same transaction.
    #[arg(long)]
    pub artifact: Option<std::path::PathBuf>,
    #[arg(long)]
    pub artifact_content_type: Option<String>,
}

pub fn complete(ctx: &Ctx, args: CompleteArgs) -> Result<i32> {
    let task_id = ctx.resolve_task_id(&args.task_id)?;
    let artifact_bytes = args.artifact.as_ref().map(std::fs::read).transpose()?;
    let artifact_filename = args.artifact.as_ref().and_then(|p| p.file_name()).and_then(|n| n.to_str()).map(str::to_string);
    let artifact = match (&artifact_filename, &artifact_bytes) {
        (Some(name), Some(bytes)) => Some((name.as_str(), args.artifact_content_type.as_deref(), bytes.as_slice())),
        _ => None,
    };
    let input = CompleteInput { review_comment: &args.review_comment, review_role: &args.review_role, artifact };
    let result = ops::complete(&ctx.layout, &task_id, input, ctx.workflow(), &ctx.actor, ctx.now, ctx.lock_timeout);
    Ok(finish(ctx.format, result))
}

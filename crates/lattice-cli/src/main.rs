// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lattice - file-based, agent-native task coordination

mod commands;
mod env;
mod output;

use clap::{Parser, Subcommand};
use commands::Ctx;
use lattice_fs::LatticeLayout;
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lattice", version, about = "File-based, agent-native task coordination")]
struct Cli {
    /// Change to <dir> before doing anything
    #[arg(short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    /// Acting actor (`prefix:identifier`); overrides `LATTICE_ACTOR`.
    #[arg(long, global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a fresh `.lattice/` directory here.
    Init,
    Create(commands::task::CreateArgs),
    Update(commands::task::UpdateArgs),
    Status(commands::task::StatusArgs),
    Assign(commands::task::AssignArgs),
    Comment(commands::task::CommentArgs),
    Link(commands::task::LinkArgs),
    Unlink(commands::task::UnlinkArgs),
    BranchLink(commands::task::BranchLinkArgs),
    BranchUnlink(commands::task::BranchLinkArgs),
    Attach(commands::task::AttachArgs),
    Archive(commands::task::ArchiveArgs),
    Unarchive(commands::task::UnarchiveArgs),
    Event(commands::task::EventArgs),
    Complete(commands::task::CompleteArgs),
    List(commands::query::ListArgs),
    Show(commands::query::ShowArgs),
    Events(commands::query::EventsArgs),
    Next(commands::query::NextArgs),
    Plan(commands::query::PlanArgs),
    Config(commands::config::ConfigArgs),
    Resource(commands::resource::ResourceArgs),
    Doctor(commands::integrity::DoctorArgs),
    Fix(commands::integrity::FixArgs),
    Rebuild(commands::integrity::RebuildArgs),
}

fn main() {
    init_logging();
    let code = run();
    std::process::exit(code);
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn run() -> i32 {
    let cli = Cli::parse();

    if let Some(dir) = &cli.directory {
        if let Err(e) = std::env::set_current_dir(dir) {
            eprintln!("[BAD_REQUEST] cannot change to directory '{}': {e}", dir.display());
            return 1;
        }
    }

    let cwd = match std::env::current_dir() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("[WRITE_ERROR] cannot read current directory: {e}");
            return 2;
        }
    };

    if matches!(cli.command, Commands::Init) {
        return match commands::init::run(&cwd, cli.output) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("[BAD_REQUEST] {e}");
                1
            }
        };
    }

    let layout = match LatticeLayout::discover_or_err(&cwd) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("[NOT_FOUND] {e}");
            return 1;
        }
    };

    let config = match lattice_store::ops::read_config(&layout) {
        Ok(c) => c,
        Err(e) => return output::print_err(cli.output, &e),
    };

    let actor = match env::resolve_actor(cli.actor.as_deref(), &config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("[BAD_REQUEST] {e}");
            return 1;
        }
    };

    let ctx = Ctx { layout, config, actor, now: env::now(), lock_timeout: env::DEFAULT_LOCK_TIMEOUT, format: cli.output };

    let result = dispatch(&ctx, cli.command);
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("[BAD_REQUEST] {e}");
            1
        }
    }
}

fn dispatch(ctx: &Ctx, command: Commands) -> anyhow::Result<i32> {
    use commands::{config, integrity, query, resource, task};
    match command {
        Commands::Init => unreachable!("Init is handled in run() before a Ctx exists"),
        Commands::Create(args) => task::create(ctx, args),
        Commands::Update(args) => task::update(ctx, args),
        Commands::Status(args) => task::status(ctx, args),
        Commands::Assign(args) => task::assign(ctx, args),
        Commands::Comment(args) => task::comment(ctx, args),
        Commands::Link(args) => task::link(ctx, args),
        Commands::Unlink(args) => task::unlink(ctx, args),
        Commands::BranchLink(args) => task::branch_link(ctx, args),
        Commands::BranchUnlink(args) => task::branch_unlink(ctx, args),
        Commands::Attach(args) => task::attach(ctx, args),
        Commands::Archive(args) => task::archive(ctx, args),
        Commands::Unarchive(args) => task::unarchive(ctx, args),
        Commands::Event(args) => task::custom_event(ctx, args),
        Commands::Complete(args) => task::complete(ctx, args),
        Commands::List(args) => query::list(ctx, args),
        Commands::Show(args) => query::show(ctx, args),
        Commands::Events(args) => query::events(ctx, args),
        Commands::Next(args) => query::next(ctx, args),
        Commands::Plan(args) => query::plan(ctx, args),
        Commands::Config(args) => config::handle(ctx, args),
        Commands::Resource(args) => resource::handle(ctx, args),
        Commands::Doctor(args) => integrity::handle_doctor(ctx, args),
        Commands::Fix(args) => integrity::handle_fix(ctx, args),
        Commands::Rebuild(args) => integrity::handle_rebuild(ctx, args),
    }
}

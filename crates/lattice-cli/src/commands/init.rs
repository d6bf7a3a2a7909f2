// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lattice init` — scaffold a fresh `.lattice/` directory in the current
//! directory (spec.md §6.1's on-disk layout has to come from somewhere;
//! every other subcommand assumes it already exists).

use crate::output::OutputFormat;
use anyhow::{anyhow, Result};
use lattice_core::Config;
use lattice_fs::{atomic_write_json, LatticeLayout};
use std::path::Path;

pub fn run(cwd: &Path, format: OutputFormat) -> Result<i32> {
    if cwd.join(lattice_fs::LATTICE_DIR_NAME).is_dir() {
        return Err(anyhow!("'.lattice' already exists in {}", cwd.display()));
    }
    let layout = LatticeLayout::new(cwd);
    layout.ensure_scaffold()?;
    let config = Config::default();
    atomic_write_json(&layout.config_path(), &config)?;

    Ok(crate::output::print_ok(format, &serde_json::json!({"root": cwd})))
}

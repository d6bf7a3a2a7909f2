// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human/JSON output modes and the exit-code mapping (spec.md §6.3).

use clap::ValueEnum;
use lattice_core::LatticeError;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Quiet,
}

/// Print a successful result and return the process exit code (always 0).
pub fn print_ok<T: Serialize>(format: OutputFormat, value: &T) -> i32 {
    match format {
        OutputFormat::Json => {
            let envelope = serde_json::json!({"ok": true, "data": value});
            println!("{}", serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| "{}".to_string()));
        }
        OutputFormat::Text => {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string()));
        }
        OutputFormat::Quiet => {}
    }
    0
}

/// Quiet mode for list/create: one line per entity ID, `(nothing)` if empty.
pub fn print_ids(format: OutputFormat, ids: &[String]) -> i32 {
    match format {
        OutputFormat::Json => {
            let envelope = serde_json::json!({"ok": true, "data": ids});
            println!("{}", serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| "{}".to_string()));
        }
        _ => {
            if ids.is_empty() {
                println!("(nothing)");
            } else {
                for id in ids {
                    println!("{id}");
                }
            }
        }
    }
    0
}

/// Dispatch a command result to [`print_ok`]/[`print_err`] in one call.
pub fn finish<T: Serialize>(format: OutputFormat, result: Result<T, LatticeError>) -> i32 {
    match result {
        Ok(value) => print_ok(format, &value),
        Err(err) => print_err(format, &err),
    }
}

/// Print an error envelope/message and return the exit code to use
/// (1 for user/validation errors, 2 for system errors, per spec.md §6.3).
pub fn print_err(format: OutputFormat, err: &LatticeError) -> i32 {
    let code = err.code();
    let message = err.to_string();
    match format {
        OutputFormat::Json => {
            let envelope = serde_json::json!({"ok": false, "error": {"code": code, "message": message}});
            println!("{}", serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| "{}".to_string()));
        }
        _ => {
            eprintln!("[{code}] {message}");
        }
    }
    err.exit_code()
}

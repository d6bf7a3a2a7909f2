// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Locking, write orchestration, short-ID allocation, resource
//! coordination, archive moves and integrity checks over a Lattice
//! project directory (spec.md §4.3 through §4.9).
//!
//! This crate is the only one that combines [`lattice_lock`] with
//! [`lattice_materialize`]'s pure fold: every public function here either
//! holds the canonical lock for the files it touches, or documents that it
//! is read-only and safe to call unlocked.

pub mod archive;
pub mod artifacts;
pub mod convert;
pub mod hooks;
pub mod ids;
pub mod integrity;
pub mod locks;
pub mod ops;
pub mod rebuild;
pub mod resources;
pub mod scan;
pub mod writer;

pub use archive::{archive_task, unarchive_task};
pub use artifacts::{ArtifactMeta, ARTIFACT_SCHEMA_VERSION};
pub use hooks::run_post_write_hooks;
pub use ids::{IdsIndex, IDS_SCHEMA_VERSION};
pub use integrity::{doctor, fix, Finding, FindingLevel, FixSummary};
pub use rebuild::{rebuild_all, rebuild_task, RebuildAllSummary};
pub use writer::write_task_events;

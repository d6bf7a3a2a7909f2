// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Interfaces for the collaborators spec.md §1 calls out as external to the
//! core: demo project seeding, plugin loading, MCP tool wrapping, and worker
//! subprocess spawning. These are "glue over core APIs"; this crate defines
//! the traits and data shapes plus an in-memory reference implementation of
//! each, used by tests and as a model for a real integration.

use lattice_core::{Actor, LatticeError, TaskId};
use lattice_fs::LatticeLayout;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GlueError {
    #[error(transparent)]
    Store(#[from] LatticeError),
    #[error("plugin '{0}' not found")]
    PluginNotFound(String),
    #[error("tool '{0}' not found")]
    ToolNotFound(String),
    #[error("process spawn failed: {0}")]
    SpawnFailed(String),
}

pub type GlueResult<T> = Result<T, GlueError>;

/// Populates a fresh `.lattice/` directory with a scripted demo timeline
/// (spec.md §1's "demo seeder"; grounded on the weekend-hackathon script in
/// `original_source/src/lattice/cli/demo_cmd.py`).
pub trait DemoSeeder {
    /// Returns the IDs of every task created, in creation order.
    fn seed(&self, layout: &LatticeLayout, actor: &Actor, now: chrono::DateTime<chrono::Utc>) -> GlueResult<Vec<TaskId>>;
}

/// A reference `DemoSeeder`: one epic with two child tasks, no artifacts or
/// resources. Real demo seeding (weekend-hackathon timeline, branch links,
/// review comments) is left to the binary that wires this trait up.
pub struct BasicDemoSeeder;

impl DemoSeeder for BasicDemoSeeder {
    fn seed(&self, layout: &LatticeLayout, actor: &Actor, now: chrono::DateTime<chrono::Utc>) -> GlueResult<Vec<TaskId>> {
        let config = lattice_store::ops::read_config(layout)?;
        let lock_timeout = Duration::from_secs(5);

        let epic_input = lattice_store::ops::CreateTaskInput {
            id: None,
            title: "Ship the demo",
            status: None,
            priority: None,
            task_type: "epic",
            description: Some("Top-level demo epic seeded by lattice-glue"),
            tags: None,
            assigned_to: None,
            urgency: None,
            complexity: None,
            custom_fields: serde_json::json!({}),
        };
        let epic = lattice_store::ops::create(layout, &config, epic_input, actor, now, lock_timeout)?;

        let child_input = lattice_store::ops::CreateTaskInput {
            id: None,
            title: "Wire up the first endpoint",
            status: None,
            priority: None,
            task_type: "task",
            description: None,
            tags: Some(vec!["demo".to_string()]),
            assigned_to: None,
            urgency: None,
            complexity: None,
            custom_fields: serde_json::json!({}),
        };
        let child = lattice_store::ops::create(layout, &config, child_input, actor, now, lock_timeout)?;
        lattice_store::ops::link(layout, &child.id, "child_of", &epic.id, None, &config.workflow, actor, now, lock_timeout)?;

        Ok(vec![epic.id, child.id])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    pub entry_point: String,
}

/// Discovers and describes plugins; loading/executing a plugin's own code is
/// out of scope here (spec.md §1 lists "plugin loader" as glue, not core).
pub trait PluginLoader {
    fn discover(&self) -> GlueResult<Vec<PluginManifest>>;
}

/// A reference loader backed by an in-memory list, for tests that need a
/// `PluginLoader` without touching a filesystem plugin directory.
pub struct StaticPluginLoader {
    pub manifests: Vec<PluginManifest>,
}

impl PluginLoader for StaticPluginLoader {
    fn discover(&self) -> GlueResult<Vec<PluginManifest>> {
        Ok(self.manifests.clone())
    }
}

/// One MCP-style tool: a name, a JSON argument schema by convention, and a
/// call that maps onto a `lattice-store::ops` function (grounded on
/// `original_source/src/lattice/mcp/tools.py`'s tool registrations).
pub trait McpTool {
    fn name(&self) -> &str;
    fn call(&self, args: serde_json::Value) -> GlueResult<serde_json::Value>;
}

/// Wraps `ops::list` as an MCP tool taking `{}` and returning the task list.
pub struct ListTasksTool {
    pub layout: LatticeLayout,
}

impl McpTool for ListTasksTool {
    fn name(&self) -> &str {
        "list_tasks"
    }

    fn call(&self, _args: serde_json::Value) -> GlueResult<serde_json::Value> {
        let filter = lattice_store::ops::ListFilter::default();
        let tasks = lattice_store::ops::list(&self.layout, &filter)?;
        Ok(serde_json::to_value(tasks).unwrap_or(serde_json::Value::Null))
    }
}

#[derive(Default)]
pub struct McpToolRegistry {
    tools: Vec<Box<dyn McpTool>>,
}

impl McpToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Box<dyn McpTool>) {
        self.tools.push(tool);
    }

    pub fn call(&self, name: &str, args: serde_json::Value) -> GlueResult<serde_json::Value> {
        self.tools.iter().find(|t| t.name() == name).ok_or_else(|| GlueError::ToolNotFound(name.to_string()))?.call(args)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Running,
    Completed,
    Failed,
}

/// A handle to a spawned worker subprocess; `lattice-core`'s
/// `active_processes` field and `process_started`/`process_completed`/
/// `process_failed` events are the durable record of this, per spec.md §1's
/// "worker subprocess lifecycle, out of core scope beyond these events".
pub trait ProcessSpawner {
    fn spawn(&self, task_id: &TaskId, process_type: &str) -> GlueResult<u64>;
    fn poll(&self, handle: u64) -> ProcessOutcome;
}

/// A fake spawner for tests: every spawn is immediately `Completed`, handles
/// are sequential counters.
#[derive(Default)]
pub struct FakeProcessSpawner {
    next_handle: std::sync::atomic::AtomicU64,
}

impl ProcessSpawner for FakeProcessSpawner {
    fn spawn(&self, _task_id: &TaskId, _process_type: &str) -> GlueResult<u64> {
        Ok(self.next_handle.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
    }

    fn poll(&self, _handle: u64) -> ProcessOutcome {
        ProcessOutcome::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::Actor;
    use lattice_fs::LatticeLayout;

    fn setup() -> (tempfile::TempDir, LatticeLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = LatticeLayout::new(dir.path());
        layout.ensure_scaffold().unwrap();
        (dir, layout)
    }

    #[test]
    fn basic_demo_seeder_creates_an_epic_and_a_linked_child() {
        let (_dir, layout) = setup();
        let actor = Actor::legacy("human", "demo");
        let ids = BasicDemoSeeder.seed(&layout, &actor, chrono::Utc::now()).unwrap();
        assert_eq!(ids.len(), 2);

        let child = lattice_store::ops::show(&layout, &ids[1]).unwrap();
        assert_eq!(child.relationships_out.len(), 1);
        assert_eq!(child.relationships_out[0].rel_type, "child_of");
    }

    #[test]
    fn static_plugin_loader_returns_its_configured_manifests() {
        let loader = StaticPluginLoader { manifests: vec![PluginManifest { name: "p".into(), version: "0.1.0".into(), entry_point: "main".into() }] };
        assert_eq!(loader.discover().unwrap().len(), 1);
    }

    #[test]
    fn mcp_registry_dispatches_by_name_and_rejects_unknown_tools() {
        let (_dir, layout) = setup();
        let mut registry = McpToolRegistry::new();
        registry.register(Box::new(ListTasksTool { layout }));
        let result = registry.call("list_tasks", serde_json::json!({}));
        assert!(result.is_ok());
        let missing = registry.call("no_such_tool", serde_json::json!({}));
        assert!(matches!(missing, Err(GlueError::ToolNotFound(_))));
    }

    #[test]
    fn fake_process_spawner_completes_immediately() {
        let spawner = FakeProcessSpawner::default();
        let task_id = TaskId::generate();
        let handle = spawner.spawn(&task_id, "claim").unwrap();
        assert_eq!(spawner.poll(handle), ProcessOutcome::Completed);
    }
}

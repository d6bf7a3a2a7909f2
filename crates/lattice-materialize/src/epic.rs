// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Derived status for epic tasks, computed from their `subtask_of` children
//! rather than stored directly (supplemented from the Python original's
//! `compute_epic_derived_status`; not present in the distilled spec, but
//! not excluded by it either).

use lattice_core::TaskSnapshot;
use std::collections::{HashMap, HashSet};

/// Highest-urgency-first precedence used to pick a single representative
/// status for an epic from its (non-terminal) children.
const STATUS_PRECEDENCE: &[&str] =
    &["needs_human", "blocked", "in_progress", "review", "planned", "in_planning", "backlog"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpicProgress {
    pub done: usize,
    pub total: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpicHealth {
    pub blocked: usize,
    pub needs_human: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpicDerivedStatus {
    pub derived_status: Option<String>,
    pub progress: EpicProgress,
    pub health: EpicHealth,
    pub child_ids: Vec<String>,
}

/// A `subtask_of` edge as `(child, parent)`, matching `relationships_out`
/// where the edge's source is the child task.
pub struct SubtaskEdge<'a> {
    pub child: &'a str,
    pub parent: &'a str,
}

/// Recursively collect descendants of `epic_id` via `subtask_of` edges and
/// summarize their statuses (spec.md §9 supplemented feature; grounded on
/// `compute_epic_derived_status` in the Python original).
pub fn compute_epic_derived_status(
    epic_id: &str,
    all_snapshots: &[TaskSnapshot],
    edges: &[SubtaskEdge<'_>],
) -> EpicDerivedStatus {
    let snap_by_id: HashMap<&str, &TaskSnapshot> =
        all_snapshots.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut parent_to_children: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        parent_to_children.entry(edge.parent).or_default().push(edge.child);
    }

    let mut child_ids: Vec<String> = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack = vec![epic_id];
    while let Some(parent) = stack.pop() {
        if let Some(children) = parent_to_children.get(parent) {
            for &child in children {
                if visited.insert(child) {
                    child_ids.push(child.to_string());
                    stack.push(child);
                }
            }
        }
    }

    let mut done = 0;
    let mut cancelled = 0;
    let mut blocked = 0;
    let mut needs_human = 0;
    let mut active_statuses: Vec<&str> = Vec::new();

    for cid in &child_ids {
        let Some(snap) = snap_by_id.get(cid.as_str()) else { continue };
        match snap.status.as_str() {
            "done" => done += 1,
            "cancelled" => cancelled += 1,
            status => {
                active_statuses.push(status);
                if status == "blocked" {
                    blocked += 1;
                }
                if status == "needs_human" {
                    needs_human += 1;
                }
            }
        }
    }

    let total = child_ids.len() - cancelled;

    let derived_status = if !active_statuses.is_empty() {
        STATUS_PRECEDENCE
            .iter()
            .find(|candidate| active_statuses.contains(candidate))
            .map(|s| s.to_string())
    } else if !child_ids.is_empty() {
        Some("done".to_string())
    } else {
        None
    };

    EpicDerivedStatus {
        derived_status,
        progress: EpicProgress { done, total, cancelled },
        health: EpicHealth { blocked, needs_human },
        child_ids,
    }
}

#[cfg(test)]
#[path = "epic_tests.rs"]
mod tests;

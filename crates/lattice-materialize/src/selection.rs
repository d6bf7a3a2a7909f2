// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `select_next` and the claim transition path (spec.md §4.8).

use lattice_core::{Actor, TaskSnapshot, WorkflowConfig};
use std::collections::{BTreeMap, VecDeque};

fn priority_rank(priority: &str) -> u8 {
    match priority {
        "critical" => 0,
        "high" => 1,
        "medium" => 2,
        "low" => 3,
        _ => 4,
    }
}

fn urgency_rank(urgency: Option<&str>) -> u8 {
    match urgency {
        Some("immediate") => 0,
        Some("high") => 1,
        Some("normal") => 2,
        Some("low") => 3,
        _ => 4,
    }
}

fn ordering_key(snapshot: &TaskSnapshot) -> (u8, u8, &str) {
    (priority_rank(&snapshot.priority), urgency_rank(snapshot.urgency.as_deref()), snapshot.id.as_str())
}

/// Pure selection over a snapshot list: resume-first, then priority/urgency
/// ranked ready pool, excluding epics (spec.md §4.8).
pub fn select_next<'a>(
    snapshots: &'a [TaskSnapshot],
    actor: Option<&Actor>,
    ready_statuses: Option<&[&str]>,
) -> Option<&'a TaskSnapshot> {
    let ready_statuses: &[&str] = ready_statuses.unwrap_or(&["backlog", "planned"]);

    if let Some(actor) = actor {
        let resume_candidate = snapshots
            .iter()
            .filter(|s| matches!(s.status.as_str(), "in_progress" | "in_planning"))
            .filter(|s| s.assigned_to.as_ref().is_some_and(|a| a.resume_key() == actor.resume_key()))
            .min_by_key(|s| ordering_key(s));
        if resume_candidate.is_some() {
            return resume_candidate;
        }
    }

    snapshots
        .iter()
        .filter(|s| ready_statuses.contains(&s.status.as_str()))
        .filter(|s| s.task_type != "epic")
        .filter(|s| match (&s.assigned_to, actor) {
            (Some(assigned), Some(actor)) => assigned.resume_key() == actor.resume_key(),
            (Some(_), None) => false,
            (None, _) => true,
        })
        .min_by_key(|s| ordering_key(s))
}

/// BFS over `config.workflow.transitions` from `from_status` to
/// `in_progress`, depth-capped at 3. Returns the ordered list of
/// intermediate statuses to walk through (not including `from_status`
/// itself), or `None` if no path exists within the cap (spec.md §4.8).
pub fn claim_transition_path(workflow: &WorkflowConfig, from_status: &str) -> Option<Vec<String>> {
    const TARGET: &str = "in_progress";
    const MAX_DEPTH: usize = 3;

    if from_status == TARGET {
        return Some(vec![]);
    }

    let mut queue: VecDeque<(String, Vec<String>)> = VecDeque::new();
    let mut came_from: BTreeMap<String, usize> = BTreeMap::new();
    queue.push_back((from_status.to_string(), vec![]));
    came_from.insert(from_status.to_string(), 0);

    while let Some((current, path)) = queue.pop_front() {
        if path.len() >= MAX_DEPTH {
            continue;
        }
        let Some(targets) = workflow.transitions.get(&current) else { continue };
        for target in targets {
            if came_from.contains_key(target) {
                continue;
            }
            let mut next_path = path.clone();
            next_path.push(target.clone());
            if target == TARGET {
                return Some(next_path);
            }
            came_from.insert(target.clone(), next_path.len());
            queue.push_back((target.clone(), next_path));
        }
    }
    None
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;

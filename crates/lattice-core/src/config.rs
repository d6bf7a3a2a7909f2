// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `config.json` shape (spec.md §6.1) and the pure workflow/policy functions
//! that read it: transition validation and completion-policy evaluation
//! (spec.md §4.7).

use crate::snapshot::TaskSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

fn default_universal_targets() -> Vec<String> {
    vec!["needs_human".to_string(), "cancelled".to_string()]
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_assigned: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub statuses: Vec<String>,
    pub transitions: BTreeMap<String, Vec<String>>,
    #[serde(default = "default_universal_targets")]
    pub universal_targets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_limits: Option<BTreeMap<String, u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_policies: Option<BTreeMap<String, CompletionPolicy>>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let statuses: Vec<String> = [
            "backlog",
            "in_planning",
            "planned",
            "in_progress",
            "review",
            "done",
            "blocked",
            "needs_human",
            "cancelled",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        let mut transitions = BTreeMap::new();
        transitions.insert("backlog".to_string(), vec!["in_planning".to_string(), "planned".to_string()]);
        transitions.insert("in_planning".to_string(), vec!["planned".to_string()]);
        transitions.insert("planned".to_string(), vec!["in_progress".to_string()]);
        transitions.insert("in_progress".to_string(), vec!["review".to_string(), "blocked".to_string()]);
        transitions.insert("review".to_string(), vec!["in_progress".to_string(), "done".to_string()]);
        transitions.insert("blocked".to_string(), vec!["in_progress".to_string()]);
        transitions.insert("done".to_string(), vec![]);
        transitions.insert("needs_human".to_string(), vec!["in_progress".to_string()]);
        transitions.insert("cancelled".to_string(), vec![]);

        Self {
            statuses,
            transitions,
            universal_targets: default_universal_targets(),
            wip_limits: None,
            roles: None,
            completion_policies: None,
        }
    }
}

impl WorkflowConfig {
    /// The canonical status ordering used to decide forward vs. backward
    /// transitions (spec.md §4.1 "Status transition rules").
    pub fn canonical_order(&self) -> &[String] {
        &self.statuses
    }

    fn rank(&self, status: &str) -> Option<usize> {
        self.statuses.iter().position(|s| s == status)
    }

    /// True if moving from `from` to `to` is a backward move in
    /// `canonical_order` (increments `reopened_count` on apply).
    pub fn is_backward_transition(&self, from: &str, to: &str) -> bool {
        match (self.rank(from), self.rank(to)) {
            (Some(a), Some(b)) => b < a,
            _ => false,
        }
    }

    /// `to` is in `config.workflow.transitions[from]` or is a universal
    /// target (spec.md §4.7).
    pub fn validate_transition(&self, from: &str, to: &str) -> bool {
        if self.universal_targets.iter().any(|t| t == to) {
            return true;
        }
        self.transitions
            .get(from)
            .is_some_and(|targets| targets.iter().any(|t| t == to))
    }

    /// The role set accepted on write: `workflow.roles` union every
    /// `completion_policies[*].require_roles`. Empty means "accept any role"
    /// (spec.md §4.7, backward compatibility).
    pub fn accepted_roles(&self) -> BTreeSet<String> {
        let mut roles: BTreeSet<String> = self.roles.iter().flatten().cloned().collect();
        if let Some(policies) = &self.completion_policies {
            for policy in policies.values() {
                roles.extend(policy.require_roles.iter().flatten().cloned());
            }
        }
        roles
    }

    pub fn is_role_accepted(&self, role: &str) -> bool {
        let accepted = self.accepted_roles();
        accepted.is_empty() || accepted.contains(role)
    }
}

/// The outcome of evaluating a completion policy (spec.md §4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCheck {
    pub ok: bool,
    pub failures: Vec<String>,
}

/// `validate(config, snapshot, target_status)` from spec.md §4.7.
pub fn evaluate_completion_policy(
    workflow: &WorkflowConfig,
    snapshot: &TaskSnapshot,
    target_status: &str,
) -> CompletionCheck {
    if workflow.universal_targets.iter().any(|t| t == target_status) {
        return CompletionCheck { ok: true, failures: vec![] };
    }
    let Some(policies) = &workflow.completion_policies else {
        return CompletionCheck { ok: true, failures: vec![] };
    };
    let Some(policy) = policies.get(target_status) else {
        return CompletionCheck { ok: true, failures: vec![] };
    };

    let mut failures = Vec::new();
    for role in policy.require_roles.iter().flatten() {
        if snapshot.evidence_ref_with_role(role).is_none() {
            failures.push(format!("missing evidence with role '{role}'"));
        }
    }
    if policy.require_assigned == Some(true) && snapshot.assigned_to.is_none() {
        failures.push("task must be assigned".to_string());
    }

    CompletionCheck { ok: failures.is_empty(), failures }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfigEntry {
    pub max_holders: u32,
    pub ttl_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HooksConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_event: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_status_change: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// `.lattice/config.json` (spec.md §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_schema_version")]
    pub schema_version: u32,
    pub default_status: String,
    pub default_priority: String,
    pub task_types: Vec<String>,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subproject_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<BTreeMap<String, ResourceConfigEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<HooksConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<DashboardConfig>,
}

fn default_config_schema_version() -> u32 {
    CONFIG_SCHEMA_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            default_status: "backlog".to_string(),
            default_priority: "medium".to_string(),
            task_types: vec!["feature".to_string(), "bug".to_string(), "chore".to_string(), "epic".to_string()],
            workflow: WorkflowConfig::default(),
            project_code: None,
            subproject_code: None,
            instance_id: None,
            instance_name: None,
            default_actor: None,
            model: None,
            heartbeat: None,
            resources: None,
            hooks: None,
            dashboard: None,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

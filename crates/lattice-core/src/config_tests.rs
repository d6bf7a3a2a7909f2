// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::actor::Actor;
use crate::id::{EventId, TaskId};
use std::collections::BTreeMap;

fn ts() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc)
}

fn base_snapshot() -> TaskSnapshot {
    TaskSnapshot {
        schema_version: 1,
        id: TaskId::new("task_01H8X9Z0J5K6M7N8P9Q0R1S2T3"),
        title: "t".to_string(),
        status: "review".to_string(),
        priority: "high".to_string(),
        urgency: None,
        complexity: None,
        task_type: "feature".to_string(),
        description: None,
        tags: None,
        assigned_to: None,
        short_id: None,
        created_by: Actor::legacy("human", "alex"),
        created_at: ts(),
        updated_at: ts(),
        done_at: None,
        relationships_out: vec![],
        evidence_refs: vec![],
        branch_links: vec![],
        comment_count: 0,
        reopened_count: 0,
        custom_fields: BTreeMap::new(),
        active_processes: None,
        last_event_id: EventId::new("ev_01H8X9Z0J5K6M7N8P9Q0R1S2T3"),
    }
}

#[test]
fn default_workflow_reaches_every_status_from_backlog_or_universal() {
    let workflow = WorkflowConfig::default();
    for status in &workflow.statuses {
        let reachable = workflow.statuses.iter().any(|from| workflow.validate_transition(from, status))
            || workflow.universal_targets.iter().any(|t| t == status)
            || status == &workflow.statuses[0];
        assert!(reachable, "{status} should be reachable");
    }
}

#[test]
fn universal_targets_are_reachable_from_every_status() {
    let workflow = WorkflowConfig::default();
    for from in &workflow.statuses {
        for target in &workflow.universal_targets {
            assert!(workflow.validate_transition(from, target));
        }
    }
}

#[test]
fn non_universal_transition_requires_explicit_listing() {
    let workflow = WorkflowConfig::default();
    assert!(!workflow.validate_transition("done", "backlog"));
}

#[test]
fn backward_transition_is_detected_by_canonical_order() {
    let workflow = WorkflowConfig::default();
    assert!(workflow.is_backward_transition("review", "in_progress"));
    assert!(!workflow.is_backward_transition("in_progress", "review"));
}

#[test]
fn completion_policy_bypassed_for_universal_targets() {
    let mut workflow = WorkflowConfig::default();
    let mut policies = BTreeMap::new();
    policies.insert(
        "done".to_string(),
        CompletionPolicy {
            require_roles: Some(vec!["review".to_string()]),
            require_assigned: None,
        },
    );
    workflow.completion_policies = Some(policies);
    let snapshot = base_snapshot();
    let check = evaluate_completion_policy(&workflow, &snapshot, "needs_human");
    assert!(check.ok);
}

#[test]
fn completion_policy_reports_missing_role_and_assignment() {
    let mut workflow = WorkflowConfig::default();
    let mut policies = BTreeMap::new();
    policies.insert(
        "done".to_string(),
        CompletionPolicy {
            require_roles: Some(vec!["review".to_string()]),
            require_assigned: Some(true),
        },
    );
    workflow.completion_policies = Some(policies);
    let snapshot = base_snapshot();
    let check = evaluate_completion_policy(&workflow, &snapshot, "done");
    assert!(!check.ok);
    assert_eq!(check.failures.len(), 2);
}

#[test]
fn completion_policy_passes_once_role_and_assignment_present() {
    use crate::snapshot::{EvidenceRef, EvidenceSourceType};
    let mut workflow = WorkflowConfig::default();
    let mut policies = BTreeMap::new();
    policies.insert(
        "done".to_string(),
        CompletionPolicy {
            require_roles: Some(vec!["review".to_string()]),
            require_assigned: Some(true),
        },
    );
    workflow.completion_policies = Some(policies);
    let mut snapshot = base_snapshot();
    snapshot.assigned_to = Some(Actor::legacy("agent", "a"));
    snapshot.evidence_refs.push(EvidenceRef {
        id: "ev_1".to_string(),
        role: Some("review".to_string()),
        source_type: EvidenceSourceType::Comment,
    });
    let check = evaluate_completion_policy(&workflow, &snapshot, "done");
    assert!(check.ok);
    assert!(check.failures.is_empty());
}

#[test]
fn accepted_roles_empty_means_anything_goes() {
    let workflow = WorkflowConfig::default();
    assert!(workflow.is_role_accepted("anything"));
}

#[test]
fn accepted_roles_rejects_unlisted_role_once_any_role_is_configured() {
    let mut workflow = WorkflowConfig::default();
    workflow.roles = Some(vec!["review".to_string(), "qa".to_string()]);
    assert!(workflow.is_role_accepted("review"));
    assert!(!workflow.is_role_accepted("reveiw"));
}

#[test]
fn config_default_round_trips() {
    let config = Config::default();
    let json = serde_json::to_string(&config).unwrap();
    let back: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(back.default_status, config.default_status);
    assert_eq!(back.workflow.statuses, config.workflow.statuses);
}

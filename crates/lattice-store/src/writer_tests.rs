use super::*;
use lattice_core::{Actor, Config};
use serde_json::json;
use tempfile::tempdir;

fn ts(s: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&chrono::Utc)
}

fn created_event(task_id: TaskId) -> Event {
    Event::for_task(
        task_id,
        et::TASK_CREATED,
        ts("2026-01-01T00:00:00Z"),
        Actor::legacy("human", "alex"),
        json!({"title": "Fix login", "status": "backlog", "priority": "high", "type": "bug"}),
    )
}

#[test]
fn write_task_events_appends_log_and_snapshot() {
    let dir = tempdir().unwrap();
    let layout = LatticeLayout::new(dir.path());
    layout.ensure_scaffold().unwrap();
    let workflow = WorkflowConfig::default();
    let task_id = TaskId::generate();

    let event = created_event(task_id.clone());
    let snap = write_task_events(&layout, &task_id, None, &[event], &workflow, Duration::from_secs(5)).unwrap();

    assert_eq!(snap.status, "backlog");
    assert!(layout.task_events_path(&task_id).exists());
    assert!(layout.task_snapshot_path(&task_id).exists());
    assert!(layout.lifecycle_path().exists());
}

#[test]
fn completion_policy_blocks_status_change_without_required_role() {
    let dir = tempdir().unwrap();
    let layout = LatticeLayout::new(dir.path());
    layout.ensure_scaffold().unwrap();
    let mut config = Config::default();
    config
        .workflow
        .completion_policies
        .get_or_insert_with(std::collections::BTreeMap::new)
        .insert(
            "done".to_string(),
            lattice_core::CompletionPolicy { require_roles: Some(vec!["review".to_string()]), require_assigned: None },
        );
    let task_id = TaskId::generate();
    let created = write_task_events(
        &layout,
        &task_id,
        None,
        &[created_event(task_id.clone())],
        &config.workflow,
        Duration::from_secs(5),
    )
    .unwrap();

    let status_event = Event::for_task(
        task_id.clone(),
        et::STATUS_CHANGED,
        ts("2026-01-01T01:00:00Z"),
        Actor::legacy("human", "alex"),
        json!({"from": "backlog", "to": "done"}),
    );
    let result = write_task_events(&layout, &task_id, Some(created), &[status_event], &config.workflow, Duration::from_secs(5));
    assert!(matches!(result, Err(LatticeError::CompletionBlocked(_))));
}

#[test]
fn forced_status_change_bypasses_completion_policy() {
    let dir = tempdir().unwrap();
    let layout = LatticeLayout::new(dir.path());
    layout.ensure_scaffold().unwrap();
    let mut config = Config::default();
    config
        .workflow
        .completion_policies
        .get_or_insert_with(std::collections::BTreeMap::new)
        .insert(
            "done".to_string(),
            lattice_core::CompletionPolicy { require_roles: Some(vec!["review".to_string()]), require_assigned: None },
        );
    let task_id = TaskId::generate();
    let created = write_task_events(
        &layout,
        &task_id,
        None,
        &[created_event(task_id.clone())],
        &config.workflow,
        Duration::from_secs(5),
    )
    .unwrap();

    let status_event = Event::for_task(
        task_id.clone(),
        et::STATUS_CHANGED,
        ts("2026-01-01T01:00:00Z"),
        Actor::legacy("human", "alex"),
        json!({"from": "backlog", "to": "done", "force": true, "reason": "hotfix"}),
    );
    let snap =
        write_task_events(&layout, &task_id, Some(created), &[status_event], &config.workflow, Duration::from_secs(5)).unwrap();
    assert_eq!(snap.status, "done");
}

#[test]
fn protected_field_update_is_rejected() {
    let dir = tempdir().unwrap();
    let layout = LatticeLayout::new(dir.path());
    layout.ensure_scaffold().unwrap();
    let workflow = WorkflowConfig::default();
    let task_id = TaskId::generate();
    let created = write_task_events(&layout, &task_id, None, &[created_event(task_id.clone())], &workflow, Duration::from_secs(5)).unwrap();

    let bad_event = Event::for_task(
        task_id.clone(),
        et::FIELD_UPDATED,
        ts("2026-01-01T01:00:00Z"),
        Actor::legacy("human", "alex"),
        json!({"field": "status", "to": "done"}),
    );
    let result = write_task_events(&layout, &task_id, Some(created), &[bad_event], &workflow, Duration::from_secs(5));
    assert!(matches!(result, Err(LatticeError::ProtectedField(_))));
}

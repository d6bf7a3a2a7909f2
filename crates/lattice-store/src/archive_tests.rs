use super::*;
use crate::writer::write_task_events;
use lattice_core::{event::event_type as et, Actor, WorkflowConfig};
use serde_json::json;
use tempfile::tempdir;

fn ts(s: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&chrono::Utc)
}

fn seed_task(layout: &LatticeLayout, task_id: &TaskId) -> TaskSnapshot {
    let event = Event::for_task(
        task_id.clone(),
        et::TASK_CREATED,
        ts("2026-01-01T00:00:00Z"),
        Actor::legacy("human", "alex"),
        json!({"title": "Ship it", "status": "backlog", "priority": "medium", "type": "task"}),
    );
    write_task_events(layout, task_id, None, &[event], &WorkflowConfig::default(), Duration::from_secs(5)).unwrap()
}

#[test]
fn archive_moves_snapshot_and_events_to_archive_dirs() {
    let dir = tempdir().unwrap();
    let layout = LatticeLayout::new(dir.path());
    layout.ensure_scaffold().unwrap();
    let task_id = TaskId::generate();
    let snap = seed_task(&layout, &task_id);

    archive_task(&layout, &task_id, snap, Actor::legacy("human", "alex"), Some("done"), ts("2026-01-02T00:00:00Z"), Duration::from_secs(5)).unwrap();

    assert!(!layout.task_snapshot_path(&task_id).exists());
    assert!(!layout.task_events_path(&task_id).exists());
    assert!(layout.archive_task_snapshot_path(&task_id).exists());
    assert!(layout.archive_task_events_path(&task_id).exists());
}

#[test]
fn archive_then_unarchive_restores_original_location() {
    let dir = tempdir().unwrap();
    let layout = LatticeLayout::new(dir.path());
    layout.ensure_scaffold().unwrap();
    let task_id = TaskId::generate();
    let snap = seed_task(&layout, &task_id);

    let archived = archive_task(&layout, &task_id, snap, Actor::legacy("human", "alex"), None, ts("2026-01-02T00:00:00Z"), Duration::from_secs(5)).unwrap();
    unarchive_task(&layout, &task_id, archived, Actor::legacy("human", "alex"), ts("2026-01-03T00:00:00Z"), Duration::from_secs(5)).unwrap();

    assert!(layout.task_snapshot_path(&task_id).exists());
    assert!(layout.task_events_path(&task_id).exists());
    assert!(!layout.archive_task_snapshot_path(&task_id).exists());
}

#[test]
fn archiving_already_archived_task_is_a_conflict() {
    let dir = tempdir().unwrap();
    let layout = LatticeLayout::new(dir.path());
    layout.ensure_scaffold().unwrap();
    let task_id = TaskId::generate();
    let snap = seed_task(&layout, &task_id);

    let archived = archive_task(&layout, &task_id, snap.clone(), Actor::legacy("human", "alex"), None, ts("2026-01-02T00:00:00Z"), Duration::from_secs(5)).unwrap();
    let result = archive_task(&layout, &task_id, archived, Actor::legacy("human", "alex"), None, ts("2026-01-02T00:00:01Z"), Duration::from_secs(5));
    assert!(matches!(result, Err(LatticeError::Conflict(_))));
}

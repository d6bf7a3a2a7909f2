// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::actor::Actor;
use crate::id::{ResourceId, TaskId};
use serde_json::json;

fn ts() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc)
}

#[test]
fn task_event_flattens_subject_fields() {
    let event = Event::for_task(
        TaskId::new("task_01H8X9Z0J5K6M7N8P9Q0R1S2T3"),
        event_type::STATUS_CHANGED,
        ts(),
        Actor::legacy("agent", "alpha"),
        json!({"from": "todo", "to": "in_progress"}),
    );
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["task_id"], "task_01H8X9Z0J5K6M7N8P9Q0R1S2T3");
    assert!(value.get("resource_id").is_none());
    assert_eq!(value["type"], "status_changed");
}

#[test]
fn resource_event_flattens_subject_fields() {
    let event = Event::for_resource(
        ResourceId::new("res_01H8X9Z0J5K6M7N8P9Q0R1S2T3"),
        event_type::RESOURCE_ACQUIRED,
        ts(),
        Actor::legacy("agent", "alpha"),
        json!({"lease_ttl_seconds": 60}),
    );
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["resource_id"], "res_01H8X9Z0J5K6M7N8P9Q0R1S2T3");
    assert!(value.get("task_id").is_none());
}

#[test]
fn event_round_trips_through_jsonl_line() {
    let event = Event::for_task(
        TaskId::generate(),
        event_type::COMMENT_ADDED,
        ts(),
        Actor::legacy("human", "morgan"),
        json!({"comment_id": "c1", "body": "hi"}),
    )
    .with_provenance(Provenance {
        triggered_by: Some("ev_xyz".to_string()),
        ..Default::default()
    });

    let line = event.to_jsonl_line().unwrap();
    assert!(line.ends_with('\n'));
    let back: Event = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(back.event_type, event.event_type);
    assert_eq!(
        back.provenance.unwrap().triggered_by.as_deref(),
        Some("ev_xyz")
    );
}

#[test]
fn unknown_event_type_still_deserializes() {
    let raw = json!({
        "schema_version": 1,
        "id": "ev_01H8X9Z0J5K6M7N8P9Q0R1S2T3",
        "ts": "2026-01-01T00:00:00Z",
        "task_id": "task_01H8X9Z0J5K6M7N8P9Q0R1S2T3",
        "type": "some_future_event_type",
        "actor": "agent:alpha",
        "data": {"whatever": true}
    });
    let event: Event = serde_json::from_value(raw).unwrap();
    assert_eq!(event.event_type, "some_future_event_type");
}

#[test]
fn custom_event_types_are_recognized_by_prefix() {
    assert!(is_custom_event_type("x_deploy_started"));
    assert!(!is_custom_event_type("status_changed"));
}

#[test]
fn only_task_created_archived_unarchived_are_lifecycle_events() {
    assert!(is_lifecycle_event(event_type::TASK_CREATED));
    assert!(is_lifecycle_event(event_type::TASK_ARCHIVED));
    assert!(is_lifecycle_event(event_type::TASK_UNARCHIVED));
    assert!(!is_lifecycle_event(event_type::STATUS_CHANGED));
    assert!(!is_lifecycle_event("x_deploy_started"));
}

#[test]
fn provenance_preserves_unknown_keys_on_round_trip() {
    let raw = json!({
        "triggered_by": "ev_1",
        "campaign": "q3-migration"
    });
    let provenance: Provenance = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(provenance.extra.get("campaign").unwrap(), "q3-migration");
    let back = serde_json::to_value(&provenance).unwrap();
    assert_eq!(back["campaign"], "q3-migration");
}

#[test]
fn subject_log_stem_matches_the_underlying_id() {
    let task_id = TaskId::generate();
    let subject = Subject::Task {
        task_id: task_id.clone(),
    };
    assert_eq!(subject.log_stem(), task_id.as_str());
}

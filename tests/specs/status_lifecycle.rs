//! Scenario 2 (spec.md §8): status lifecycle gated by a completion policy.

#[path = "prelude.rs"]
mod prelude;
use prelude::Project;
use serde_json::json;

fn config_with_review_gate() -> serde_json::Value {
    json!({
        "schema_version": 1,
        "default_status": "backlog",
        "default_priority": "medium",
        "task_types": ["feature", "bug", "chore", "epic"],
        "workflow": {
            "statuses": ["backlog", "in_planning", "planned", "in_progress", "review", "done", "blocked", "needs_human", "cancelled"],
            "transitions": {
                "backlog": ["in_planning", "planned"],
                "in_planning": ["planned"],
                "planned": ["in_progress"],
                "in_progress": ["review", "blocked"],
                "review": ["in_progress", "done"],
                "blocked": ["in_progress"],
                "done": [],
                "needs_human": ["in_progress"],
                "cancelled": []
            },
            "universal_targets": ["needs_human", "cancelled"],
            "completion_policies": {
                "done": { "require_roles": ["review"] }
            }
        }
    })
}

#[test]
fn done_is_blocked_until_a_review_comment_lands_then_succeeds() {
    let project = Project::new();
    project.write_config(&config_with_review_gate());

    let created = project.lattice().args(&["-o", "json", "create", "Ship the feature"]).passes().json();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    project.lattice().args(&["status", &id, "in_planning"]).passes();
    project.lattice().args(&["status", &id, "planned"]).passes();
    project.lattice().args(&["status", &id, "in_progress"]).passes();
    project.lattice().args(&["status", &id, "review"]).passes();

    let blocked = project.lattice().args(&["-o", "json", "status", &id, "done"]).fails();
    assert_eq!(blocked.json()["error"]["code"], "COMPLETION_BLOCKED");

    project.lattice().args(&["comment", "add", &id, "LGTM", "--role", "review"]).passes();

    let done = project.lattice().args(&["-o", "json", "status", &id, "done"]).passes().json();
    assert_eq!(done["data"]["status"], "done");
    assert!(done["data"]["done_at"].is_string());
}

//! Boundary behaviors (spec.md §8): edge cases around selection and role
//! validation that the main scenarios don't otherwise exercise.

#[path = "prelude.rs"]
mod prelude;
use prelude::Project;
use serde_json::json;

#[test]
fn next_on_an_empty_project_returns_a_null_task() {
    let project = Project::new();
    let result = project.lattice().args(&["-o", "json", "next"]).passes().json();
    assert!(result["data"].is_null());
}

#[test]
fn next_never_selects_an_epic_even_at_the_highest_priority() {
    let project = Project::new();
    project.lattice().args(&["create", "--type", "epic", "--priority", "high", "--status", "planned", "Umbrella epic"]).passes();
    let regular = project.lattice().args(&["-o", "json", "create", "--priority", "low", "--status", "planned", "Ordinary task"]).passes().json();
    let regular_id = regular["data"]["id"].as_str().unwrap().to_string();

    let selected = project.lattice().args(&["-o", "json", "next"]).passes().json();
    assert_eq!(selected["data"]["id"], regular_id);
}

#[test]
fn claiming_a_backlog_task_walks_every_hop_to_in_progress() {
    let project = Project::new();
    let created = project.lattice().args(&["-o", "json", "create", "--status", "backlog", "Needs planning first"]).passes().json();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let claimed = project.lattice_as("agent:alpha").args(&["-o", "json", "next", "--claim"]).passes().json();
    assert_eq!(claimed["data"]["id"], id);
    assert_eq!(claimed["data"]["status"], "in_progress");

    let events = project.lattice().args(&["-o", "json", "events", &id]).passes().json();
    let status_hops: Vec<&str> = events["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["type"] == "status_changed")
        .map(|e| e["data"]["to"].as_str().unwrap())
        .collect();
    assert_eq!(status_hops, vec!["planned", "in_progress"]);
}

#[test]
fn claiming_a_planned_task_emits_exactly_one_status_hop() {
    let project = Project::new();
    let created = project.lattice().args(&["-o", "json", "create", "--status", "planned", "Ready to go"]).passes().json();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    project.lattice_as("agent:alpha").args(&["-o", "json", "next", "--claim"]).passes();

    let events = project.lattice().args(&["-o", "json", "events", &id]).passes().json();
    let status_hops: Vec<&str> = events["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["type"] == "status_changed")
        .map(|e| e["data"]["to"].as_str().unwrap())
        .collect();
    assert_eq!(status_hops, vec!["in_progress"]);
}

#[test]
fn an_unrecognized_role_is_rejected_and_names_the_valid_ones() {
    let project = Project::new();
    project.write_config(&json!({
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
    }));

    let created = project.lattice().args(&["-o", "json", "create", "Needs a sign-off"]).passes().json();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let rejected = project.lattice().args(&["-o", "json", "comment", "add", &id, "typo'd role", "--role", "reveiw"]).fails().json();
    assert_eq!(rejected["error"]["code"], "INVALID_ROLE");
    assert!(rejected["error"]["message"].as_str().unwrap().contains("review"));
}

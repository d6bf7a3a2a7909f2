//! Scenario 3 (spec.md §8): two actors race `next --claim` on one ready task.

#[path = "prelude.rs"]
mod prelude;
use prelude::Project;

#[test]
fn one_claimant_wins_and_active_processes_reflects_the_winner() {
    let project = Project::new();
    let created = project.lattice().args(&["-o", "json", "create", "--status", "planned", "Ready task"]).passes().json();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let alpha = project.lattice_as("agent:alpha").args(&["-o", "json", "next", "--claim"]).passes().json();
    assert_eq!(alpha["data"]["id"], id);
    assert_eq!(alpha["data"]["status"], "in_progress");
    assert_eq!(alpha["data"]["assigned_to"], "agent:alpha");

    let active = alpha["data"]["active_processes"].as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["process_type"], "claim");

    let bravo = project.lattice_as("agent:bravo").args(&["-o", "json", "next", "--claim"]).run();
    if bravo.code() == Some(0) {
        assert_ne!(bravo.json()["data"]["id"], id);
    } else {
        assert_eq!(bravo.json()["error"]["code"], "ALREADY_CLAIMED");
    }
}

//! Scenario 1 (spec.md §8): create + idempotent retry, conflict on divergence.

#[path = "prelude.rs"]
mod prelude;
use prelude::Project;

#[test]
fn identical_create_retry_returns_the_same_snapshot() {
    let project = Project::new();
    project.lattice().args(&["config", "set-project-code", "DEMO"]).passes();

    let id = "task_00000000000000000000000000";
    let first = project
        .lattice()
        .args(&["-o", "json", "create", "--id", id, "--priority", "high", "Fix login"])
        .passes()
        .json();
    assert_eq!(first["data"]["priority"], "high");
    assert_eq!(first["data"]["short_id"], "DEMO-1");

    let second = project
        .lattice()
        .args(&["-o", "json", "create", "--id", id, "--priority", "high", "Fix login"])
        .passes()
        .json();
    assert_eq!(first["data"], second["data"]);
}

#[test]
fn create_retry_with_a_different_title_conflicts() {
    let project = Project::new();
    let id = "task_00000000000000000000000001";
    project.lattice().args(&["create", "--id", id, "Fix login"]).passes();

    let retry = project.lattice().args(&["-o", "json", "create", "--id", id, "Fix logout"]).fails();
    assert_eq!(retry.code(), Some(1));
    assert_eq!(retry.json()["error"]["code"], "CONFLICT");
}

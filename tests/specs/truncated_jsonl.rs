//! Scenario 6 (spec.md §8): a truncated final line in a task's event log
//! (simulating a crash mid-append) is caught by `doctor` and trimmed by
//! `fix`, without disturbing the events that came before it.

#[path = "prelude.rs"]
mod prelude;
use prelude::Project;
use std::io::Write;

#[test]
fn doctor_flags_a_truncated_tail_and_fix_strips_it_leaving_prior_events_intact() {
    let project = Project::new();
    let created = project.lattice().args(&["-o", "json", "create", "Ship the release"]).passes().json();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    project.lattice().args(&["comment", "add", &id, "first note"]).passes();

    let events_path = project.events_path(&id);
    let before = std::fs::read_to_string(&events_path).unwrap();
    let line_count_before = before.lines().count();

    let mut file = std::fs::OpenOptions::new().append(true).open(&events_path).unwrap();
    write!(file, "{{\"event_type\":\"comment_added\",\"task_id\":").unwrap();
    drop(file);

    let dirty = project.lattice().args(&["-o", "json", "doctor"]).passes().json();
    let findings = dirty["data"].as_array().unwrap();
    assert!(
        findings.iter().any(|f| f["check"] == "jsonl_parseable" && f["task_id"] == id && f["level"] == "warning"),
        "expected a truncated-tail warning, got {findings:?}"
    );

    project.lattice().args(&["fix"]).passes();

    let clean = project.lattice().args(&["-o", "json", "doctor"]).passes().json();
    assert!(clean["data"].as_array().unwrap().is_empty(), "expected doctor to be clean after fix, got {clean:?}");

    let after = std::fs::read_to_string(&events_path).unwrap();
    assert_eq!(after.lines().count(), line_count_before);
    assert_eq!(after.lines().collect::<Vec<_>>(), before.lines().collect::<Vec<_>>());

    let rebuild_check = project.lattice().args(&["-o", "json", "rebuild", &id]).passes().json();
    assert_eq!(rebuild_check["data"]["id"], id);
}

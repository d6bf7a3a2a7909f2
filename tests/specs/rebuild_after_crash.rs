//! Scenario 5 (spec.md §8): snapshot drift caught by `doctor` and repaired
//! by `rebuild`, simulating a crash that left a stale snapshot on disk.

#[path = "prelude.rs"]
mod prelude;
use prelude::Project;

#[test]
fn doctor_flags_snapshot_drift_and_rebuild_repairs_it() {
    let project = Project::new();
    let created = project.lattice().args(&["-o", "json", "create", "Ship the release"]).passes().json();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    project.lattice().args(&["status", &id, "planned"]).passes();

    let clean = project.lattice().args(&["-o", "json", "doctor"]).passes().json();
    assert!(clean["data"].as_array().unwrap().is_empty(), "expected a clean doctor report, got {clean:?}");

    let snapshot_path = project.snapshot_path(&id);
    let mut snapshot: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&snapshot_path).unwrap()).unwrap();
    snapshot["last_event_id"] = serde_json::json!("evt_0000000000000000000000garbage");
    std::fs::write(&snapshot_path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();

    let dirty = project.lattice().args(&["-o", "json", "doctor"]).passes().json();
    let findings = dirty["data"].as_array().unwrap();
    assert!(findings.iter().any(|f| f["check"] == "snapshot_drift" && f["task_id"] == id), "expected a snapshot_drift finding, got {findings:?}");

    project.lattice().args(&["rebuild", &id]).passes();

    let repaired = project.lattice().args(&["-o", "json", "doctor"]).passes().json();
    let findings = repaired["data"].as_array().unwrap();
    assert!(findings.is_empty(), "expected doctor to be clean after rebuild, got {findings:?}");

    let rebuilt: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&snapshot_path).unwrap()).unwrap();
    assert_eq!(rebuilt["status"], "planned");
}

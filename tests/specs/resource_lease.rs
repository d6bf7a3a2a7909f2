//! Scenario 4 (spec.md §8): resource lease acquire, TTL expiry, handoff.

#[path = "prelude.rs"]
mod prelude;
use prelude::Project;
use std::thread::sleep;
use std::time::Duration;

#[test]
fn heartbeat_after_ttl_expiry_fails_and_the_lease_passes_to_the_next_acquirer() {
    let project = Project::new();

    project
        .lattice_as("agent:a")
        .args(&["-o", "json", "resource", "create", "build_lock", "--max-holders", "1", "--ttl-seconds", "1"])
        .passes();

    let acquired = project.lattice_as("agent:a").args(&["-o", "json", "resource", "acquire", "build_lock"]).passes().json();
    assert_eq!(acquired["data"]["holders"].as_array().unwrap().len(), 1);
    assert_eq!(acquired["data"]["holders"][0]["actor"], "agent:a");

    sleep(Duration::from_millis(1500));

    let stale_heartbeat = project.lattice_as("agent:a").args(&["-o", "json", "resource", "heartbeat", "build_lock"]).fails().json();
    assert_eq!(stale_heartbeat["error"]["code"], "EXPIRED");

    let took_over = project.lattice_as("agent:b").args(&["-o", "json", "resource", "acquire", "build_lock"]).passes().json();
    let holders = took_over["data"]["holders"].as_array().unwrap();
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0]["actor"], "agent:b");

    let status = project.lattice().args(&["-o", "json", "resource", "status", "build_lock"]).passes().json();
    assert_eq!(status["data"]["holders"][0]["actor"], "agent:b");
}

use super::*;
use lattice_core::Actor;
use tempfile::tempdir;

fn ts(s: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&chrono::Utc)
}

#[test]
fn store_artifact_writes_payload_and_hashed_meta() {
    let dir = tempdir().unwrap();
    let layout = LatticeLayout::new(dir.path());
    layout.ensure_scaffold().unwrap();
    let task_id = TaskId::generate();

    let meta = store_artifact(
        &layout,
        &task_id,
        "report.txt",
        Some("text/plain"),
        b"hello world",
        &Actor::legacy("human", "alex"),
        ts("2026-01-01T00:00:00Z"),
    )
    .unwrap();

    assert_eq!(meta.size_bytes, 11);
    assert_eq!(meta.sha256, format!("{:x}", sha2::Sha256::digest(b"hello world")));
    assert!(layout.artifact_meta_path(&meta.id).exists());
    let payload_path = layout.artifacts_payload_dir().join(format!("{}.txt", meta.id));
    assert_eq!(std::fs::read(payload_path).unwrap(), b"hello world");
}

#[test]
fn load_artifact_meta_round_trips() {
    let dir = tempdir().unwrap();
    let layout = LatticeLayout::new(dir.path());
    layout.ensure_scaffold().unwrap();
    let task_id = TaskId::generate();

    let meta = store_artifact(
        &layout,
        &task_id,
        "diagram.bin",
        None,
        b"binary-stuff",
        &Actor::legacy("agent", "reviewer"),
        ts("2026-01-01T00:00:00Z"),
    )
    .unwrap();

    let reloaded = load_artifact_meta(&layout, &meta.id).unwrap();
    assert_eq!(reloaded.sha256, meta.sha256);
    assert_eq!(reloaded.filename, "diagram.bin");
}

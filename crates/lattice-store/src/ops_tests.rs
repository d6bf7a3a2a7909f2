use super::*;
use std::time::Duration;
use tempfile::tempdir;

fn ts(s: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&chrono::Utc)
}

fn setup() -> (tempfile::TempDir, LatticeLayout) {
    let dir = tempdir().unwrap();
    let layout = LatticeLayout::new(dir.path());
    layout.ensure_scaffold().unwrap();
    (dir, layout)
}

fn basic_input(id: Option<TaskId>) -> CreateTaskInput<'static> {
    CreateTaskInput {
        id,
        title: "Fix login",
        status: Some("backlog"),
        priority: Some("high"),
        task_type: "bug",
        description: None,
        tags: None,
        assigned_to: None,
        urgency: None,
        complexity: None,
        custom_fields: json!({}),
    }
}

#[test]
fn create_is_idempotent_on_identical_retry_and_conflicts_on_divergence() {
    let (_dir, layout) = setup();
    let config = Config::default();
    let actor = Actor::legacy("human", "alex");
    let id = TaskId::generate();

    let first = create(&layout, &config, basic_input(Some(id.clone())), &actor, ts("2026-01-01T00:00:00Z"), Duration::from_secs(5)).unwrap();
    let retry = create(&layout, &config, basic_input(Some(id.clone())), &actor, ts("2026-01-01T00:00:01Z"), Duration::from_secs(5)).unwrap();
    assert_eq!(first.id, retry.id);
    assert_eq!(first.last_event_id, retry.last_event_id);

    let mut divergent = basic_input(Some(id));
    divergent.title = "Something else";
    let result = create(&layout, &config, divergent, &actor, ts("2026-01-01T00:00:02Z"), Duration::from_secs(5));
    assert!(matches!(result, Err(LatticeError::Conflict(_))));
}

#[test]
fn create_assigns_short_id_when_project_code_configured() {
    let (_dir, layout) = setup();
    let mut config = Config::default();
    config.project_code = Some("DEMO".to_string());
    let actor = Actor::legacy("human", "alex");

    let snap = create(&layout, &config, basic_input(None), &actor, ts("2026-01-01T00:00:00Z"), Duration::from_secs(5)).unwrap();

    assert_eq!(snap.short_id.as_deref(), Some("DEMO-1"));
}

#[test]
fn status_lifecycle_with_completion_gate_then_review_comment_unblocks_it() {
    let (_dir, layout) = setup();
    let mut config = Config::default();
    config.workflow.completion_policies = Some(
        [("done".to_string(), lattice_core::CompletionPolicy { require_roles: Some(vec!["review".to_string()]), require_assigned: None })]
            .into_iter()
            .collect(),
    );
    let actor = Actor::legacy("human", "alex");
    let snap = create(&layout, &config, basic_input(None), &actor, ts("2026-01-01T00:00:00Z"), Duration::from_secs(5)).unwrap();
    let task_id = snap.id.clone();

    for (from_to, _) in [("in_planning", 1), ("planned", 2), ("in_progress", 3), ("review", 4)] {
        set_status(&layout, &task_id, from_to, None, &config.workflow, &actor, ts("2026-01-01T01:00:00Z"), Duration::from_secs(5)).unwrap();
    }

    let blocked = set_status(&layout, &task_id, "done", None, &config.workflow, &actor, ts("2026-01-01T02:00:00Z"), Duration::from_secs(5));
    assert!(matches!(blocked, Err(LatticeError::CompletionBlocked(_))));

    comment(&layout, &task_id, "LGTM", Some("review"), &config.workflow, &actor, ts("2026-01-01T02:30:00Z"), Duration::from_secs(5)).unwrap();

    let done = set_status(&layout, &task_id, "done", None, &config.workflow, &actor, ts("2026-01-01T03:00:00Z"), Duration::from_secs(5)).unwrap();
    assert_eq!(done.status, "done");
    assert!(done.done_at.is_some());
}

#[test]
fn invalid_transition_is_rejected_without_force() {
    let (_dir, layout) = setup();
    let config = Config::default();
    let actor = Actor::legacy("human", "alex");
    let snap = create(&layout, &config, basic_input(None), &actor, ts("2026-01-01T00:00:00Z"), Duration::from_secs(5)).unwrap();

    let result = set_status(&layout, &snap.id, "done", None, &config.workflow, &actor, ts("2026-01-01T01:00:00Z"), Duration::from_secs(5));
    assert!(matches!(result, Err(LatticeError::InvalidTransition { .. })));
}

#[test]
fn comment_with_unconfigured_role_is_rejected() {
    let (_dir, layout) = setup();
    let mut config = Config::default();
    config.workflow.roles = Some(vec!["review".to_string()]);
    let actor = Actor::legacy("human", "alex");
    let snap = create(&layout, &config, basic_input(None), &actor, ts("2026-01-01T00:00:00Z"), Duration::from_secs(5)).unwrap();

    let result = comment(&layout, &snap.id, "typo role", Some("reveiw"), &config.workflow, &actor, ts("2026-01-01T01:00:00Z"), Duration::from_secs(5));
    assert!(matches!(result, Err(LatticeError::InvalidRole { .. })));
}

#[test]
fn link_then_unlink_leaves_relationships_empty() {
    let (_dir, layout) = setup();
    let config = Config::default();
    let actor = Actor::legacy("human", "alex");
    let a = create(&layout, &config, basic_input(None), &actor, ts("2026-01-01T00:00:00Z"), Duration::from_secs(5)).unwrap();
    let b = create(&layout, &config, basic_input(None), &actor, ts("2026-01-01T00:00:01Z"), Duration::from_secs(5)).unwrap();

    let linked = link(&layout, &a.id, "blocks", &b.id, None, &config.workflow, &actor, ts("2026-01-01T01:00:00Z"), Duration::from_secs(5)).unwrap();
    assert_eq!(linked.relationships_out.len(), 1);

    let dup = link(&layout, &a.id, "blocks", &b.id, None, &config.workflow, &actor, ts("2026-01-01T01:00:01Z"), Duration::from_secs(5));
    assert!(matches!(dup, Err(LatticeError::Conflict(_))));

    let self_link = link(&layout, &a.id, "blocks", &a.id, None, &config.workflow, &actor, ts("2026-01-01T01:00:02Z"), Duration::from_secs(5));
    assert!(matches!(self_link, Err(LatticeError::Validation(_))));

    let unlinked = unlink(&layout, &a.id, "blocks", &b.id, &config.workflow, &actor, ts("2026-01-01T01:00:03Z"), Duration::from_secs(5)).unwrap();
    assert!(unlinked.relationships_out.is_empty());
}

#[test]
fn complete_folds_review_comment_and_status_hops_into_one_transaction() {
    let (_dir, layout) = setup();
    let mut config = Config::default();
    config.workflow.completion_policies = Some(
        [("done".to_string(), lattice_core::CompletionPolicy { require_roles: Some(vec!["review".to_string()]), require_assigned: None })]
            .into_iter()
            .collect(),
    );
    let actor = Actor::legacy("agent", "worker-1");
    let snap = create(&layout, &config, basic_input(None), &actor, ts("2026-01-01T00:00:00Z"), Duration::from_secs(5)).unwrap();
    set_status(&layout, &snap.id, "in_planning", None, &config.workflow, &actor, ts("2026-01-01T00:10:00Z"), Duration::from_secs(5)).unwrap();
    set_status(&layout, &snap.id, "planned", None, &config.workflow, &actor, ts("2026-01-01T00:20:00Z"), Duration::from_secs(5)).unwrap();
    set_status(&layout, &snap.id, "in_progress", None, &config.workflow, &actor, ts("2026-01-01T00:30:00Z"), Duration::from_secs(5)).unwrap();

    let input = CompleteInput { review_comment: "ship it", review_role: "review", artifact: None };
    let done = complete(&layout, &snap.id, input, &config.workflow, &actor, ts("2026-01-01T01:00:00Z"), Duration::from_secs(5)).unwrap();

    assert_eq!(done.status, "done");
    assert_eq!(done.comment_count, 1);
    assert!(done.evidence_ref_with_role("review").is_some());
}

#[test]
fn archive_then_unarchive_round_trips_through_ops() {
    let (_dir, layout) = setup();
    let config = Config::default();
    let actor = Actor::legacy("human", "alex");
    let snap = create(&layout, &config, basic_input(None), &actor, ts("2026-01-01T00:00:00Z"), Duration::from_secs(5)).unwrap();

    archive(&layout, &snap.id, actor.clone(), Some("stale"), ts("2026-01-01T01:00:00Z"), Duration::from_secs(5)).unwrap();
    assert!(layout.archive_task_snapshot_path(&snap.id).exists());
    assert!(show(&layout, &snap.id).is_ok());

    unarchive(&layout, &snap.id, actor, ts("2026-01-01T02:00:00Z"), Duration::from_secs(5)).unwrap();
    assert!(layout.task_snapshot_path(&snap.id).exists());
}

#[test]
fn next_prefers_resume_then_falls_back_to_priority_ordering() {
    let (_dir, layout) = setup();
    let config = Config::default();
    let actor = Actor::legacy("human", "alex");
    let mut low = basic_input(None);
    low.priority = Some("low");
    low.status = Some("backlog");
    let low_snap = create(&layout, &config, low, &actor, ts("2026-01-01T00:00:00Z"), Duration::from_secs(5)).unwrap();
    let mut high = basic_input(None);
    high.priority = Some("critical");
    high.status = Some("backlog");
    let high_snap = create(&layout, &config, high, &actor, ts("2026-01-01T00:00:01Z"), Duration::from_secs(5)).unwrap();

    let selected = next(&layout, None, None).unwrap().unwrap();
    assert_eq!(selected.id, high_snap.id);
    let _ = low_snap;
}

#[test]
fn claim_next_walks_the_transition_path_to_in_progress_and_assigns_the_claimant() {
    let (_dir, layout) = setup();
    let config = Config::default();
    let actor = Actor::legacy("agent", "worker-1");
    let snap = create(&layout, &config, basic_input(None), &actor, ts("2026-01-01T00:00:00Z"), Duration::from_secs(5)).unwrap();
    assert_eq!(snap.status, "backlog");

    let claimed = claim_next(&layout, &actor, None, &config.workflow, ts("2026-01-01T01:00:00Z"), Duration::from_secs(5)).unwrap().unwrap();
    assert_eq!(claimed.status, "in_progress");
    assert_eq!(claimed.assigned_to, Some(actor.clone()));
    let active = claimed.active_processes.as_ref().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].process_type, "claim");
}

#[test]
fn claim_next_rejects_a_second_actor_once_the_first_has_claimed() {
    let (_dir, layout) = setup();
    let config = Config::default();
    let alpha = Actor::legacy("agent", "alpha");
    let bravo = Actor::legacy("agent", "bravo");
    create(&layout, &config, basic_input(None), &alpha, ts("2026-01-01T00:00:00Z"), Duration::from_secs(5)).unwrap();

    let won = claim_next(&layout, &alpha, None, &config.workflow, ts("2026-01-01T01:00:00Z"), Duration::from_secs(5)).unwrap().unwrap();
    assert_eq!(won.assigned_to, Some(alpha.clone()));

    let result = claim_next(&layout, &bravo, None, &config.workflow, ts("2026-01-01T01:00:01Z"), Duration::from_secs(5));
    assert!(matches!(result, Ok(None) | Err(LatticeError::AlreadyClaimed { .. })));
}

#[test]
fn set_project_code_then_set_subproject_code_updates_config() {
    let (_dir, layout) = setup();
    set_project_code(&layout, "DEMO", Duration::from_secs(5)).unwrap();
    set_subproject_code(&layout, "API", Duration::from_secs(5)).unwrap();

    let config = read_config(&layout).unwrap();
    assert_eq!(config.project_code.as_deref(), Some("DEMO"));
    assert_eq!(config.subproject_code.as_deref(), Some("API"));
}

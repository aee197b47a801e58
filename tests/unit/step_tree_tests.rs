use super::*;
use crate::progress::aggregate;

fn three_pending() -> StepTree {
    StepTree::from_steps(vec![
        Step::new("s1", "Collect sources"),
        Step::new("s2", "Draft outline"),
        Step::new("s3", "Write summary"),
    ])
}

fn nested_tree() -> StepTree {
    StepTree::from_steps(vec![
        Step::new("plan", "Plan")
            .with_child(Step::new("plan-a", "Read brief"))
            .with_child(Step::new("plan-b", "Pick sources").with_child(Step::new("plan-b-1", "Rank"))),
        Step::new("write", "Write"),
    ])
}

#[test]
fn status_coercion_maps_aliases_and_defaults_unknown_to_pending() {
    assert_eq!(StepStatus::coerce("in_progress"), StepStatus::Running);
    assert_eq!(StepStatus::coerce("DONE"), StepStatus::Completed);
    assert_eq!(StepStatus::coerce("failed"), StepStatus::Error);
    assert_eq!(StepStatus::coerce("banana"), StepStatus::Pending);
    let parsed: StepStatus = serde_json::from_str("\"Running\"").expect("status should parse");
    assert_eq!(parsed, StepStatus::Running);
    assert_eq!(
        serde_json::to_string(&StepStatus::Completed).expect("status should serialize"),
        "\"completed\""
    );
}

#[test]
fn apply_update_finds_nested_steps_by_id() {
    let mut tree = nested_tree();
    let outcome = tree.apply_update("plan-b-1", &StepUpdate::status(StepStatus::Running));
    assert_eq!(outcome, UpdateOutcome::StatusChanged);
    let node = tree.find("plan-b-1").expect("nested step should exist");
    assert_eq!(node.status, StepStatus::Running);
    assert!(node.start_time.is_some());
}

#[test]
fn unknown_step_update_is_a_no_op() {
    let mut tree = StepTree::from_steps(vec![Step::new("only", "Only step")]);
    let before = tree.clone();
    let before_summary = aggregate(tree.roots(), None);
    let outcome = tree.apply_update("ghost", &StepUpdate::status(StepStatus::Completed));
    assert_eq!(outcome, UpdateOutcome::NotFound);
    assert_eq!(tree, before);
    assert_eq!(aggregate(tree.roots(), None), before_summary);
}

#[test]
fn completing_twice_is_idempotent() {
    let mut tree = three_pending();
    tree.apply_update("s1", &StepUpdate::status(StepStatus::Running));
    let first = tree.apply_update("s1", &StepUpdate::status(StepStatus::Completed));
    assert_eq!(first, UpdateOutcome::StatusChanged);
    let after_first = tree.clone();
    let end_time = tree.find("s1").and_then(|s| s.end_time);
    assert!(end_time.is_some());

    let second = tree.apply_update("s1", &StepUpdate::status(StepStatus::Completed));
    assert_eq!(second, UpdateOutcome::Unchanged);
    assert_eq!(tree, after_first);
    assert_eq!(tree.find("s1").and_then(|s| s.end_time), end_time);
}

#[test]
fn completion_shows_full_percentage_and_error_freezes_last_value() {
    let mut tree = three_pending();
    tree.apply_update("s1", &StepUpdate::status(StepStatus::Running));
    tree.apply_update("s1", &StepUpdate::percentage(40.0));
    tree.apply_update("s1", &StepUpdate::status(StepStatus::Completed));
    assert_eq!(tree.find("s1").and_then(Step::display_percentage), Some(100.0));

    tree.apply_update("s2", &StepUpdate::status(StepStatus::Running));
    tree.apply_update("s2", &StepUpdate::percentage(65.0));
    tree.apply_update("s2", &StepUpdate::status(StepStatus::Error));
    assert_eq!(tree.find("s2").and_then(Step::display_percentage), Some(65.0));
}

#[test]
fn late_running_update_does_not_reopen_finished_step() {
    let mut tree = three_pending();
    tree.apply_update("s1", &StepUpdate::status(StepStatus::Completed));
    let outcome = tree.apply_update(
        "s1",
        &StepUpdate {
            status: Some(StepStatus::Running),
            percentage: Some(30.0),
            ..StepUpdate::default()
        },
    );
    assert_eq!(outcome, UpdateOutcome::Unchanged);
    let node = tree.find("s1").expect("step exists");
    assert_eq!(node.status, StepStatus::Completed);
    assert_eq!(node.display_percentage(), Some(100.0));
}

#[test]
fn running_percentage_is_clamped_and_never_regresses() {
    let mut tree = three_pending();
    tree.apply_update("s1", &StepUpdate::status(StepStatus::Running));
    assert_eq!(
        tree.apply_update("s1", &StepUpdate::percentage(150.0)),
        UpdateOutcome::ProgressChanged
    );
    assert_eq!(tree.find("s1").and_then(|s| s.percentage), Some(100.0));

    tree.apply_update("s2", &StepUpdate::status(StepStatus::Running));
    tree.apply_update("s2", &StepUpdate::percentage(-5.0));
    assert_eq!(tree.find("s2").and_then(|s| s.percentage), Some(0.0));
    tree.apply_update("s2", &StepUpdate::percentage(50.0));
    assert_eq!(
        tree.apply_update("s2", &StepUpdate::percentage(20.0)),
        UpdateOutcome::Unchanged
    );
    assert_eq!(tree.find("s2").and_then(|s| s.percentage), Some(50.0));
}

#[test]
fn percentage_for_pending_step_is_ignored() {
    let mut tree = three_pending();
    assert_eq!(
        tree.apply_update("s3", &StepUpdate::percentage(20.0)),
        UpdateOutcome::Unchanged
    );
    assert_eq!(tree.find("s3").and_then(|s| s.percentage), None);
}

#[test]
fn insert_appends_in_arrival_order() {
    let mut tree = StepTree::new();
    assert_eq!(tree.insert_step(None, Step::new("b", "Second")), InsertOutcome::Inserted);
    assert_eq!(tree.insert_step(None, Step::new("a", "First")), InsertOutcome::Inserted);
    assert_eq!(tree.insert_step(Some("b"), Step::new("b2", "Child 2")), InsertOutcome::Inserted);
    assert_eq!(tree.insert_step(Some("b"), Step::new("b1", "Child 1")), InsertOutcome::Inserted);

    let ids: Vec<&str> = walk(tree.roots()).map(|(_, s)| s.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "b2", "b1", "a"]);
}

#[test]
fn insert_with_unknown_parent_attaches_at_root_and_duplicates_are_ignored() {
    let mut tree = StepTree::new();
    assert_eq!(
        tree.insert_step(Some("missing"), Step::new("orphan", "Orphan")),
        InsertOutcome::AttachedToRoot
    );
    assert_eq!(
        tree.insert_step(None, Step::new("orphan", "Again")),
        InsertOutcome::Duplicate
    );
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.find("orphan").map(|s| s.name.as_str()), Some("Orphan"));
}

#[test]
fn status_counts_always_cover_every_step() {
    let mut tree = nested_tree();
    let total = tree.len();
    let updates = [
        ("plan", StepStatus::Running),
        ("plan-a", StepStatus::Running),
        ("plan-a", StepStatus::Completed),
        ("ghost", StepStatus::Completed),
        ("plan-b-1", StepStatus::Error),
        ("plan-b", StepStatus::Running),
        ("plan-b", StepStatus::Pending),
        ("write", StepStatus::Completed),
        ("plan", StepStatus::Completed),
    ];
    for (id, status) in updates {
        tree.apply_update(id, &StepUpdate::status(status));
        let counts = aggregate(tree.roots(), None).counts;
        assert_eq!(counts.total(), total);
        assert_eq!(
            counts.pending + counts.running + counts.completed + counts.error,
            total
        );
    }
}

#[test]
fn current_step_descends_into_first_running_child() {
    let mut tree = nested_tree();
    assert!(tree.current_step().is_none());
    tree.apply_update("plan", &StepUpdate::status(StepStatus::Running));
    tree.apply_update("plan-b", &StepUpdate::status(StepStatus::Running));
    tree.apply_update("write", &StepUpdate::status(StepStatus::Running));
    assert_eq!(tree.current_step().map(|s| s.id.as_str()), Some("plan-b"));
}

#[test]
fn rows_are_depth_capped() {
    let mut deep = Step::new("d5", "Level 5");
    for level in (0..5).rev() {
        deep = Step::new(format!("d{level}"), format!("Level {level}")).with_child(deep);
    }
    let tree = StepTree::from_steps(vec![deep]);
    let rows = tree.rows(3);
    let step_rows = rows
        .iter()
        .filter(|row| matches!(row, StepRow::Step { .. }))
        .count();
    assert_eq!(step_rows, 3);
    assert!(rows.contains(&StepRow::Truncated {
        depth: 3,
        hidden: 3
    }));
}

#[test]
fn deeply_nested_tree_does_not_overflow_lookup() {
    let mut deep = Step::new("leaf", "Leaf");
    for level in 0..2_000 {
        deep = Step::new(format!("n{level}"), "node").with_child(deep);
    }
    let mut tree = StepTree::from_steps(vec![deep]);
    assert_eq!(
        tree.apply_update("leaf", &StepUpdate::status(StepStatus::Running)),
        UpdateOutcome::StatusChanged
    );
    assert_eq!(tree.len(), 2_001);
    assert_eq!(tree.current_step().map(|s| s.id.as_str()), None);
}

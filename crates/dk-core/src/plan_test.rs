use super::*;
use std::path::PathBuf;

fn script(id: u64, label: &str, direction: Direction) -> MigrationScript {
    let mut script = MigrationScript {
        id: MigrationId::new(id),
        label: label.to_string(),
        direction,
        path: PathBuf::new(),
        body: format!("-- {} {}", direction, label),
    };
    script.path = PathBuf::from(script.file_name());
    script
}

/// Five paired migrations with identifiers 100..=500
fn five_pairs() -> ScriptSet {
    let mut set = ScriptSet::new();
    for (i, label) in ["a", "b", "c", "d", "e"].iter().enumerate() {
        let id = (i as u64 + 1) * 100;
        set.insert(script(id, label, Direction::Up));
        set.insert(script(id, label, Direction::Down));
    }
    set
}

fn ids(values: &[u64]) -> BTreeSet<MigrationId> {
    values.iter().copied().map(MigrationId::new).collect()
}

fn raw(plan: &Plan) -> Vec<u64> {
    plan.identifiers().iter().map(|id| id.value()).collect()
}

#[test]
fn test_step_limit_from_signed() {
    assert_eq!(StepLimit::from_signed(-1), StepLimit::All);
    assert_eq!(StepLimit::from_signed(-42), StepLimit::All);
    assert_eq!(StepLimit::from_signed(0), StepLimit::AtMost(0));
    assert_eq!(StepLimit::from_signed(3), StepLimit::AtMost(3));
}

#[test]
fn test_up_plans_all_pending_oldest_first() {
    let plan = plan(Direction::Up, &five_pairs(), &BTreeSet::new(), StepLimit::All);
    assert_eq!(plan.direction(), Direction::Up);
    assert_eq!(raw(&plan), vec![100, 200, 300, 400, 500]);
}

#[test]
fn test_up_never_includes_applied() {
    let applied = ids(&[100, 300]);
    let plan = plan(Direction::Up, &five_pairs(), &applied, StepLimit::All);
    assert_eq!(raw(&plan), vec![200, 400, 500]);
    assert!(plan.identifiers().iter().all(|id| !applied.contains(id)));
}

#[test]
fn test_up_step_limit_takes_earliest() {
    let plan = plan(
        Direction::Up,
        &five_pairs(),
        &ids(&[100]),
        StepLimit::AtMost(2),
    );
    assert_eq!(raw(&plan), vec![200, 300]);
}

#[test]
fn test_up_step_limit_larger_than_pending() {
    let plan = plan(
        Direction::Up,
        &five_pairs(),
        &ids(&[100, 200, 300]),
        StepLimit::AtMost(10),
    );
    assert_eq!(raw(&plan), vec![400, 500]);
}

#[test]
fn test_up_everything_applied_is_empty() {
    let plan = plan(
        Direction::Up,
        &five_pairs(),
        &ids(&[100, 200, 300, 400, 500]),
        StepLimit::All,
    );
    assert!(plan.is_empty());
}

#[test]
fn test_zero_steps_is_empty() {
    let plan = plan(
        Direction::Up,
        &five_pairs(),
        &BTreeSet::new(),
        StepLimit::AtMost(0),
    );
    assert!(plan.is_empty());
}

#[test]
fn test_down_plans_applied_newest_first() {
    let plan = plan(
        Direction::Down,
        &five_pairs(),
        &ids(&[100, 200, 300]),
        StepLimit::All,
    );
    assert_eq!(plan.direction(), Direction::Down);
    assert_eq!(raw(&plan), vec![300, 200, 100]);
}

#[test]
fn test_down_never_includes_unapplied() {
    let applied = ids(&[200, 400]);
    let plan = plan(Direction::Down, &five_pairs(), &applied, StepLimit::All);
    assert_eq!(raw(&plan), vec![400, 200]);
    assert!(plan.identifiers().iter().all(|id| applied.contains(id)));
}

#[test]
fn test_down_step_limit_takes_most_recent() {
    let plan = plan(
        Direction::Down,
        &five_pairs(),
        &ids(&[100, 200, 300, 400]),
        StepLimit::AtMost(1),
    );
    assert_eq!(raw(&plan), vec![400]);
}

#[test]
fn test_down_with_empty_ledger_is_empty() {
    let plan = plan(
        Direction::Down,
        &five_pairs(),
        &BTreeSet::new(),
        StepLimit::All,
    );
    assert!(plan.is_empty());
}

#[test]
fn test_down_skips_applied_without_down_script() {
    let mut set = ScriptSet::new();
    set.insert(script(1, "a", Direction::Up));
    set.insert(script(2, "b", Direction::Up));
    set.insert(script(2, "b", Direction::Down));

    let plan = plan(Direction::Down, &set, &ids(&[1, 2]), StepLimit::All);
    assert_eq!(raw(&plan), vec![2]);
}

#[test]
fn test_migration_carries_script_query() {
    let set = five_pairs();
    let plan = plan(Direction::Up, &set, &BTreeSet::new(), StepLimit::AtMost(1));
    let migration = &plan.migrations()[0];
    assert_eq!(migration.name(), "100__a");
    assert_eq!(migration.direction, Direction::Up);
    assert_eq!(
        migration.queries,
        vec![Query {
            name: "100__a".to_string(),
            value: "-- up a".to_string(),
        }]
    );
}

//! End-to-end engine behavior against in-memory DuckDB and migration files
//! on disk.

use async_trait::async_trait;
use dk_core::{discover, Direction, MigrationId, ScriptSet, StepLimit};
use dk_db::{Database, DbResult, DuckDbBackend};
use dk_migrate::{checked_scripts, AssumeYes, MigrateError, Migrator, MigratorOptions};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Wraps a backend and remembers every statement handed to it
struct RecordingDatabase {
    inner: DuckDbBackend,
    statements: Mutex<Vec<String>>,
    units: AtomicUsize,
}

impl RecordingDatabase {
    fn new() -> Self {
        Self {
            inner: DuckDbBackend::in_memory().unwrap(),
            statements: Mutex::new(Vec::new()),
            units: AtomicUsize::new(0),
        }
    }

    fn record(&self, sql: &str) {
        self.statements.lock().unwrap().push(sql.to_string());
    }

    fn statement_count(&self) -> usize {
        self.statements.lock().unwrap().len()
    }

    fn units(&self) -> usize {
        self.units.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Database for RecordingDatabase {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.record(sql);
        self.inner.execute(sql).await
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.record(sql);
        self.inner.execute_batch(sql).await
    }

    async fn execute_unit(&self, statements: &[String]) -> DbResult<()> {
        self.units.fetch_add(1, Ordering::SeqCst);
        for sql in statements {
            self.record(sql);
        }
        self.inner.execute_unit(statements).await
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<String>>> {
        self.inner.query_rows(sql).await
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.inner.relation_exists(name).await
    }

    fn db_type(&self) -> &'static str {
        self.inner.db_type()
    }
}

fn write_pair(dir: &Path, id: u64, label: &str, up: &str, down: &str) {
    fs::write(dir.join(format!("{id}__{label}.up.sql")), up).unwrap();
    fs::write(dir.join(format!("{id}__{label}.down.sql")), down).unwrap();
}

/// Five pairs, each creating and dropping its own table
fn five_tables() -> TempDir {
    let dir = TempDir::new().unwrap();
    for (id, name) in [(1000, "t1"), (2000, "t2"), (3000, "t3"), (4000, "t4"), (5000, "t5")] {
        write_pair(
            dir.path(),
            id,
            &format!("create_{name}"),
            &format!("CREATE TABLE {name} (id INT);"),
            &format!("DROP TABLE {name};"),
        );
    }
    dir
}

fn load(dir: &Path) -> ScriptSet {
    let discovery = discover(dir).unwrap();
    checked_scripts(&discovery).unwrap().clone()
}

fn setup() -> (Arc<RecordingDatabase>, Migrator) {
    let db = Arc::new(RecordingDatabase::new());
    let migrator = Migrator::new(db.clone(), MigratorOptions::default()).unwrap();
    (db, migrator)
}

fn ids(values: &[u64]) -> BTreeSet<MigrationId> {
    values.iter().copied().map(MigrationId::new).collect()
}

#[tokio::test]
async fn test_up_applies_everything_then_replans_empty() {
    let dir = five_tables();
    let scripts = load(dir.path());
    let (db, migrator) = setup();

    let report = migrator
        .run(&scripts, Direction::Up, StepLimit::All, &mut AssumeYes)
        .await
        .unwrap();
    assert_eq!(report.applied, 5);
    assert_eq!(
        migrator.ledger().applied().await.unwrap(),
        ids(&[1000, 2000, 3000, 4000, 5000])
    );
    assert!(db.relation_exists("t5").await.unwrap());

    let again = migrator
        .plan_only(&scripts, Direction::Up, StepLimit::All)
        .await
        .unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_up_with_limit_takes_earliest() {
    let dir = five_tables();
    let scripts = load(dir.path());
    let (_db, migrator) = setup();

    let report = migrator
        .run(&scripts, Direction::Up, StepLimit::AtMost(2), &mut AssumeYes)
        .await
        .unwrap();
    assert_eq!(report.applied, 2);
    assert_eq!(migrator.ledger().applied().await.unwrap(), ids(&[1000, 2000]));

    // More steps than pending applies only what is left
    let report = migrator
        .run(&scripts, Direction::Up, StepLimit::AtMost(10), &mut AssumeYes)
        .await
        .unwrap();
    assert_eq!(report.applied, 3);
}

#[tokio::test]
async fn test_down_reverts_everything_newest_first() {
    let dir = five_tables();
    let scripts = load(dir.path());
    let (db, migrator) = setup();

    migrator
        .run(&scripts, Direction::Up, StepLimit::All, &mut AssumeYes)
        .await
        .unwrap();
    let statements_after_up = db.statement_count();

    let report = migrator
        .run(&scripts, Direction::Down, StepLimit::All, &mut AssumeYes)
        .await
        .unwrap();
    assert_eq!(report.applied, 5);
    assert!(migrator.ledger().applied().await.unwrap().is_empty());

    let drops: Vec<String> = db.statements.lock().unwrap()[statements_after_up..]
        .iter()
        .filter(|sql| sql.starts_with("DROP TABLE"))
        .cloned()
        .collect();
    assert_eq!(
        drops,
        vec![
            "DROP TABLE t5;",
            "DROP TABLE t4;",
            "DROP TABLE t3;",
            "DROP TABLE t2;",
            "DROP TABLE t1;",
        ]
    );
}

#[tokio::test]
async fn test_down_with_limit_takes_most_recent() {
    let dir = five_tables();
    let scripts = load(dir.path());
    let (db, migrator) = setup();

    migrator
        .run(&scripts, Direction::Up, StepLimit::AtMost(3), &mut AssumeYes)
        .await
        .unwrap();
    let report = migrator
        .run(&scripts, Direction::Down, StepLimit::AtMost(2), &mut AssumeYes)
        .await
        .unwrap();

    assert_eq!(report.planned.identifiers(), vec![MigrationId::new(3000), MigrationId::new(2000)]);
    assert_eq!(migrator.ledger().applied().await.unwrap(), ids(&[1000]));
    assert!(db.relation_exists("t1").await.unwrap());
    assert!(!db.relation_exists("t2").await.unwrap());
}

#[tokio::test]
async fn test_failure_mid_plan_keeps_earlier_work() {
    let dir = five_tables();
    write_pair(
        dir.path(),
        3000,
        "create_t3",
        "CREATE TABLE t3 (id INT); INSERT INTO no_such_table VALUES (1);",
        "DROP TABLE t3;",
    );
    let scripts = load(dir.path());
    let (db, migrator) = setup();

    let err = migrator
        .run(&scripts, Direction::Up, StepLimit::All, &mut AssumeYes)
        .await
        .unwrap_err();

    match &err {
        MigrateError::Execution { id, name, applied, .. } => {
            assert_eq!(*id, MigrationId::new(3000));
            assert_eq!(name, "3000__create_t3");
            assert_eq!(*applied, 2);
        }
        other => panic!("expected execution error, got {other}"),
    }
    assert_eq!(err.applied_count(), 2);

    // 1 and 2 committed, 3 rolled back, 4 and 5 never attempted
    assert_eq!(db.units(), 3);
    assert_eq!(migrator.ledger().applied().await.unwrap(), ids(&[1000, 2000]));
    assert!(!db.relation_exists("t3").await.unwrap());
    assert!(!db.relation_exists("t4").await.unwrap());

    let resume = migrator
        .plan_only(&scripts, Direction::Up, StepLimit::All)
        .await
        .unwrap();
    assert_eq!(resume.identifiers().first(), Some(&MigrationId::new(3000)));
}

#[tokio::test]
async fn test_declined_confirmation_changes_nothing() {
    let dir = five_tables();
    let scripts = load(dir.path());
    let (db, migrator) = setup();

    migrator
        .run(&scripts, Direction::Up, StepLimit::All, &mut AssumeYes)
        .await
        .unwrap();
    let units_before = db.units();
    let statements_before = db.statement_count();

    let mut prompted = 0;
    let mut decline = |_: &dk_core::Plan| {
        prompted += 1;
        Ok::<_, std::io::Error>(false)
    };
    let err = migrator
        .run(&scripts, Direction::Down, StepLimit::All, &mut decline)
        .await
        .unwrap_err();

    assert!(matches!(err, MigrateError::ConfirmationDeclined));
    assert_eq!(prompted, 1);
    assert_eq!(db.units(), units_before);
    // Only the idempotent ledger bootstrap ran
    let new_statements: Vec<String> =
        db.statements.lock().unwrap()[statements_before..].to_vec();
    assert!(new_statements
        .iter()
        .all(|sql| sql.starts_with("CREATE TABLE IF NOT EXISTS")));
    assert_eq!(migrator.ledger().applied().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_down_skips_migrations_without_down_script() {
    let dir = TempDir::new().unwrap();
    write_pair(dir.path(), 1, "a", "CREATE TABLE a (id INT);", "DROP TABLE a;");
    fs::write(dir.path().join("2__b.up.sql"), "CREATE TABLE b (id INT);").unwrap();
    let scripts = load(dir.path());
    let (_db, migrator) = setup();

    migrator
        .run(&scripts, Direction::Up, StepLimit::All, &mut AssumeYes)
        .await
        .unwrap();
    let report = migrator
        .run(&scripts, Direction::Down, StepLimit::All, &mut AssumeYes)
        .await
        .unwrap();

    assert_eq!(report.planned.identifiers(), vec![MigrationId::new(1)]);
    assert_eq!(migrator.ledger().applied().await.unwrap(), ids(&[2]));
}

#[tokio::test]
async fn test_empty_scaffolded_pair_still_recorded() {
    let dir = TempDir::new().unwrap();
    write_pair(dir.path(), 42, "placeholder", "", "");
    let scripts = load(dir.path());
    let (_db, migrator) = setup();

    let report = migrator
        .run(&scripts, Direction::Up, StepLimit::All, &mut AssumeYes)
        .await
        .unwrap();
    assert_eq!(report.applied, 1);
    assert!(migrator.ledger().is_applied(MigrationId::new(42)).await.unwrap());
}

#[tokio::test]
async fn test_duplicate_identifiers_block_planning() {
    let dir = five_tables();
    fs::write(dir.path().join("1000__other.up.sql"), "SELECT 1;").unwrap();
    let discovery = discover(dir.path()).unwrap();

    let err = checked_scripts(&discovery).unwrap_err();
    assert!(err.to_string().starts_with("[M001]"));
}

#[tokio::test]
async fn test_custom_ledger_table() {
    let dir = five_tables();
    let scripts = load(dir.path());
    let db = Arc::new(RecordingDatabase::new());
    let migrator = Migrator::new(
        db.clone(),
        MigratorOptions {
            ledger_table: "ops.schema_history".to_string(),
        },
    )
    .unwrap();

    migrator
        .run(&scripts, Direction::Up, StepLimit::AtMost(1), &mut AssumeYes)
        .await
        .unwrap();
    assert!(db.relation_exists("ops.schema_history").await.unwrap());
    assert!(!db.relation_exists("deckard_migrations").await.unwrap());
}

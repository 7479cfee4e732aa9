use super::*;
use dk_db::DuckDbBackend;

fn memory_db() -> Arc<dyn Database> {
    Arc::new(DuckDbBackend::in_memory().unwrap())
}

#[tokio::test]
async fn test_rejects_unsafe_table_names() {
    for name in ["", "1abc", "a b", "a;drop", "a.b.c", "x-y"] {
        let err = Ledger::new(memory_db(), name).err().unwrap();
        assert!(matches!(err, MigrateError::InvalidLedgerTable(_)), "{name}");
    }
    assert!(Ledger::new(memory_db(), "ops.history").is_ok());
}

#[tokio::test]
async fn test_ensure_is_idempotent() {
    let db = memory_db();
    let ledger = Ledger::new(db.clone(), DEFAULT_LEDGER_TABLE).unwrap();
    assert!(!ledger.exists().await.unwrap());

    ledger.ensure().await.unwrap();
    ledger.record_applied(MigrationId::new(1), "init").await.unwrap();
    ledger.ensure().await.unwrap();

    assert!(ledger.exists().await.unwrap());
    assert!(ledger.is_applied(MigrationId::new(1)).await.unwrap());
}

#[tokio::test]
async fn test_ensure_creates_schema_for_qualified_name() {
    let db = memory_db();
    let ledger = Ledger::new(db.clone(), "ops.history").unwrap();
    ledger.ensure().await.unwrap();
    assert!(db.relation_exists("ops.history").await.unwrap());
}

#[tokio::test]
async fn test_record_and_remove() {
    let ledger = Ledger::new(memory_db(), "ledger").unwrap();
    ledger.ensure().await.unwrap();

    ledger.record_applied(MigrationId::new(100), "a").await.unwrap();
    ledger.record_applied(MigrationId::new(200), "b").await.unwrap();
    assert_eq!(
        ledger.applied().await.unwrap(),
        BTreeSet::from([MigrationId::new(100), MigrationId::new(200)])
    );

    ledger.remove_applied(MigrationId::new(100)).await.unwrap();
    assert!(!ledger.is_applied(MigrationId::new(100)).await.unwrap());
    assert!(ledger.is_applied(MigrationId::new(200)).await.unwrap());
}

#[tokio::test]
async fn test_identifier_recorded_once() {
    let ledger = Ledger::new(memory_db(), "ledger").unwrap();
    ledger.ensure().await.unwrap();
    ledger.record_applied(MigrationId::new(7), "x").await.unwrap();

    let err = ledger
        .record_applied(MigrationId::new(7), "x")
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::Ledger { .. }));
}

#[tokio::test]
async fn test_entries_are_numerically_ordered() {
    let ledger = Ledger::new(memory_db(), "ledger").unwrap();
    ledger.ensure().await.unwrap();
    ledger.record_applied(MigrationId::new(1000), "later").await.unwrap();
    ledger.record_applied(MigrationId::new(999), "earlier").await.unwrap();

    let entries = ledger.entries().await.unwrap();
    let ids: Vec<u64> = entries.iter().map(|e| e.id.value()).collect();
    assert_eq!(ids, vec![999, 1000]);
    assert_eq!(entries[0].label, "earlier");
    assert!(!entries[0].applied_at.is_empty());
}

#[tokio::test]
async fn test_label_with_quote_is_escaped() {
    let ledger = Ledger::new(memory_db(), "ledger").unwrap();
    ledger.ensure().await.unwrap();
    ledger
        .record_applied(MigrationId::new(5), "it's_fine")
        .await
        .unwrap();

    let entries = ledger.entries().await.unwrap();
    assert_eq!(entries[0].label, "it's_fine");
}

#[tokio::test]
async fn test_corrupt_identifier_is_reported() {
    let db = memory_db();
    let ledger = Ledger::new(db.clone(), "ledger").unwrap();
    ledger.ensure().await.unwrap();
    db.execute("INSERT INTO ledger (identifier, label) VALUES ('abc', 'bad')")
        .await
        .unwrap();

    let err = ledger.applied().await.unwrap_err();
    assert!(matches!(err, MigrateError::CorruptLedger { ref value, .. } if value == "abc"));
}

#[tokio::test]
async fn test_missing_table_is_a_ledger_error() {
    let ledger = Ledger::new(memory_db(), "ledger").unwrap();
    let err = ledger.applied().await.unwrap_err();
    assert!(err.to_string().contains("[M002]"));
}

#[test]
fn test_mutation_statements() {
    let ledger = Ledger::new(memory_db(), "deckard_migrations").unwrap();
    assert_eq!(
        ledger.record_statement(MigrationId::new(42), "add_users"),
        "INSERT INTO deckard_migrations (identifier, label) VALUES ('42', 'add_users')"
    );
    assert_eq!(
        ledger.remove_statement(MigrationId::new(42)),
        "DELETE FROM deckard_migrations WHERE identifier = '42'"
    );
}

//! Persistent record of applied migrations.
//!
//! The ledger is a table in the target database keyed by the canonical
//! decimal rendering of each [`MigrationId`]. Every value is read back
//! through `CAST(... AS VARCHAR)` so both backends hand over plain text.

use crate::error::{MigrateError, MigrateResult};
use dk_core::config::is_valid_table_name;
pub use dk_core::config::DEFAULT_LEDGER_TABLE;
use dk_core::MigrationId;
use dk_db::{quote_literal, Database, DbError};
use std::collections::BTreeSet;
use std::sync::Arc;

/// One applied migration as stored in the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: MigrationId,
    pub label: String,

    /// Database-rendered timestamp of when the entry was recorded
    pub applied_at: String,
}

/// Ledger table bound to a database connection
pub struct Ledger {
    db: Arc<dyn Database>,
    table: String,
}

impl Ledger {
    /// Bind a ledger table. The name must be a plain, optionally
    /// schema-qualified, SQL identifier since it is spliced into statements.
    pub fn new(db: Arc<dyn Database>, table: impl Into<String>) -> MigrateResult<Self> {
        let table = table.into();
        if !is_valid_table_name(&table) {
            return Err(MigrateError::InvalidLedgerTable(table));
        }
        Ok(Self { db, table })
    }

    /// Table name as configured
    pub fn table(&self) -> &str {
        &self.table
    }

    fn ledger_error(&self, source: DbError) -> MigrateError {
        MigrateError::Ledger {
            table: self.table.clone(),
            source,
        }
    }

    /// Create the ledger table (and its schema) if missing. Idempotent.
    pub async fn ensure(&self) -> MigrateResult<()> {
        if let Some((schema, _)) = self.table.split_once('.') {
            self.db
                .execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))
                .await
                .map_err(|e| self.ledger_error(e))?;
        }

        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
    identifier VARCHAR PRIMARY KEY,
    label      VARCHAR NOT NULL,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)",
            self.table
        );
        self.db
            .execute_batch(&ddl)
            .await
            .map_err(|e| self.ledger_error(e))?;
        log::debug!("Ledger table {} ready", self.table);
        Ok(())
    }

    /// Whether the ledger table exists, without creating it
    pub async fn exists(&self) -> MigrateResult<bool> {
        self.db
            .relation_exists(&self.table)
            .await
            .map_err(|e| self.ledger_error(e))
    }

    fn parse_id(&self, value: &str) -> MigrateResult<MigrationId> {
        MigrationId::parse(value.trim()).ok_or_else(|| MigrateError::CorruptLedger {
            table: self.table.clone(),
            value: value.to_string(),
        })
    }

    /// All entries, ascending by identifier
    pub async fn entries(&self) -> MigrateResult<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT identifier, label, CAST(applied_at AS VARCHAR) FROM {}",
            self.table
        );
        let rows = self
            .db
            .query_rows(&sql)
            .await
            .map_err(|e| self.ledger_error(e))?;

        let mut entries = rows
            .into_iter()
            .map(|row| {
                let mut cols = row.into_iter();
                let id = self.parse_id(&cols.next().unwrap_or_default())?;
                Ok(LedgerEntry {
                    id,
                    label: cols.next().unwrap_or_default(),
                    applied_at: cols.next().unwrap_or_default(),
                })
            })
            .collect::<MigrateResult<Vec<_>>>()?;

        // Text keys sort lexically in the database; order numerically here
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }

    /// Snapshot of applied identifiers
    pub async fn applied(&self) -> MigrateResult<BTreeSet<MigrationId>> {
        let sql = format!("SELECT identifier FROM {}", self.table);
        let rows = self
            .db
            .query_rows(&sql)
            .await
            .map_err(|e| self.ledger_error(e))?;

        rows.iter()
            .map(|row| self.parse_id(row.first().map(String::as_str).unwrap_or_default()))
            .collect()
    }

    /// Whether a single identifier has been recorded
    pub async fn is_applied(&self, id: MigrationId) -> MigrateResult<bool> {
        let sql = format!(
            "SELECT CAST(COUNT(*) AS VARCHAR) FROM {} WHERE identifier = {}",
            self.table,
            quote_literal(&id.to_string())
        );
        let rows = self
            .db
            .query_rows(&sql)
            .await
            .map_err(|e| self.ledger_error(e))?;

        let count = rows
            .first()
            .and_then(|row| row.first())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        Ok(count > 0)
    }

    /// SQL that records an applied migration
    pub fn record_statement(&self, id: MigrationId, label: &str) -> String {
        format!(
            "INSERT INTO {} (identifier, label) VALUES ({}, {})",
            self.table,
            quote_literal(&id.to_string()),
            quote_literal(label)
        )
    }

    /// SQL that removes a reverted migration
    pub fn remove_statement(&self, id: MigrationId) -> String {
        format!(
            "DELETE FROM {} WHERE identifier = {}",
            self.table,
            quote_literal(&id.to_string())
        )
    }

    /// Record an entry outside of any migration unit
    pub async fn record_applied(&self, id: MigrationId, label: &str) -> MigrateResult<()> {
        self.db
            .execute(&self.record_statement(id, label))
            .await
            .map_err(|e| self.ledger_error(e))?;
        Ok(())
    }

    /// Remove an entry outside of any migration unit
    pub async fn remove_applied(&self, id: MigrationId) -> MigrateResult<()> {
        self.db
            .execute(&self.remove_statement(id))
            .await
            .map_err(|e| self.ledger_error(e))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;

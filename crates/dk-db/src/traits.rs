//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;

/// Database abstraction trait for Deckard
///
/// The engine only needs raw SQL execution and an all-or-nothing unit of
/// work; everything else is built on top of those.
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute SQL that modifies data, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute every SQL text in `statements` inside one transaction.
    ///
    /// Either all of them take effect or, on the first failure, none do.
    /// Each entry may contain several statements.
    async fn execute_unit(&self, statements: &[String]) -> DbResult<()>;

    /// Run a query and return every row with each column rendered as text
    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<String>>>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Split `schema.table` into its parts; unqualified names have no schema
pub(crate) fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.rfind('.') {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

/// Quote `value` as a SQL string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

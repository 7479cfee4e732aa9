//! Runs a plan one migration at a time, each inside its own transaction.

use crate::error::MigrateError;
use crate::ledger::Ledger;
use dk_core::{Direction, Migration, MigrationId, Plan};
use dk_db::{Database, DbError};
use std::time::Instant;

/// A migration failed. Everything before it is committed; nothing after it ran.
#[derive(Debug)]
pub struct ExecutionFailure {
    /// Migrations committed before the failure
    pub applied: usize,
    pub id: MigrationId,

    /// `<identifier>__<label>` of the failed migration
    pub name: String,
    pub source: DbError,
}

impl From<ExecutionFailure> for MigrateError {
    fn from(failure: ExecutionFailure) -> Self {
        MigrateError::Execution {
            id: failure.id,
            name: failure.name,
            applied: failure.applied,
            source: failure.source,
        }
    }
}

/// The statements run for one migration: its body, then the ledger mutation.
///
/// Whitespace-only bodies contribute nothing, so an empty scaffolded script
/// still records (or removes) its ledger entry.
pub fn unit_of_work(ledger: &Ledger, migration: &Migration) -> Vec<String> {
    let mut statements: Vec<String> = migration
        .queries
        .iter()
        .filter(|q| !q.value.trim().is_empty())
        .map(|q| q.value.clone())
        .collect();

    if statements.is_empty() {
        log::debug!("Migration {} has an empty body", migration.name());
    }

    statements.push(match migration.direction {
        Direction::Up => ledger.record_statement(migration.id, &migration.label),
        Direction::Down => ledger.remove_statement(migration.id),
    });
    statements
}

/// Execute every migration in the plan, stopping at the first failure.
///
/// Returns the number of migrations applied.
pub async fn execute(
    db: &dyn Database,
    ledger: &Ledger,
    plan: &Plan,
) -> Result<usize, ExecutionFailure> {
    let mut applied = 0;

    for migration in plan.migrations() {
        let name = migration.name();
        let start = Instant::now();

        if let Err(source) = db.execute_unit(&unit_of_work(ledger, migration)).await {
            log::error!(
                "{} migration {} failed after {} applied: {}",
                plan.direction(),
                name,
                applied,
                source
            );
            return Err(ExecutionFailure {
                applied,
                id: migration.id,
                name,
                source,
            });
        }

        applied += 1;
        log::info!(
            "Applied {} migration {} ({}ms)",
            plan.direction(),
            name,
            start.elapsed().as_millis()
        );
    }

    Ok(applied)
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;

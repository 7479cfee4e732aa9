//! Engine entry point: ensure ledger, plan, confirm, execute.

use crate::error::{MigrateError, MigrateResult};
use crate::executor::execute;
use crate::gate::Confirmation;
use crate::ledger::{Ledger, DEFAULT_LEDGER_TABLE};
use dk_core::{plan, Direction, Discovery, MigrationId, Plan, ScriptSet, StepLimit};
use dk_db::Database;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Engine settings
#[derive(Debug, Clone)]
pub struct MigratorOptions {
    pub ledger_table: String,
}

impl Default for MigratorOptions {
    fn default() -> Self {
        Self {
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub direction: Direction,

    /// What the planner selected
    pub planned: Plan,

    /// How many of the planned migrations were executed
    pub applied: usize,
}

/// One row of `status` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub id: MigrationId,
    pub label: String,
    pub applied: bool,
    pub applied_at: Option<String>,
    pub has_up: bool,
    pub has_down: bool,

    /// Recorded in the ledger but no script exists on disk
    pub orphaned: bool,
}

/// Turn a directory scan into a script set, refusing to continue when
/// discovery found duplicate identifiers.
pub fn checked_scripts(discovery: &Discovery) -> MigrateResult<&ScriptSet> {
    if discovery.has_fatal_issues() {
        let issues = discovery.fatal_issues().into_iter().cloned().collect();
        return Err(MigrateError::Discovery(issues));
    }
    Ok(&discovery.scripts)
}

/// Runs migrations against one database connection
pub struct Migrator {
    db: Arc<dyn Database>,
    ledger: Ledger,
}

impl Migrator {
    pub fn new(db: Arc<dyn Database>, options: MigratorOptions) -> MigrateResult<Self> {
        let ledger = Ledger::new(db.clone(), options.ledger_table)?;
        Ok(Self { db, ledger })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Compute what a run would do without touching the database. A missing
    /// ledger means nothing has been applied.
    pub async fn plan_only(
        &self,
        scripts: &ScriptSet,
        direction: Direction,
        limit: StepLimit,
    ) -> MigrateResult<Plan> {
        if !self.ledger.exists().await? {
            log::debug!("Ledger {} does not exist yet", self.ledger.table());
            return Ok(plan(direction, scripts, &BTreeSet::new(), limit));
        }
        self.planned(scripts, direction, limit).await
    }

    async fn planned(
        &self,
        scripts: &ScriptSet,
        direction: Direction,
        limit: StepLimit,
    ) -> MigrateResult<Plan> {
        let applied = self.ledger.applied().await?;
        log::debug!("{} migration(s) recorded in {}", applied.len(), self.ledger.table());
        Ok(plan(direction, scripts, &applied, limit))
    }

    /// Plan and execute. Down plans must pass `gate` first; an empty plan
    /// never prompts.
    pub async fn run(
        &self,
        scripts: &ScriptSet,
        direction: Direction,
        limit: StepLimit,
        gate: &mut dyn Confirmation,
    ) -> MigrateResult<RunReport> {
        self.ledger.ensure().await?;
        let planned = self.planned(scripts, direction, limit).await?;

        if planned.is_empty() {
            log::info!("No {} migrations to run", direction);
            return Ok(RunReport {
                direction,
                planned,
                applied: 0,
            });
        }

        if direction == Direction::Down && !gate.confirm(&planned)? {
            log::info!("Down run declined; nothing executed");
            return Err(MigrateError::ConfirmationDeclined);
        }

        let applied = execute(self.db.as_ref(), &self.ledger, &planned).await?;
        Ok(RunReport {
            direction,
            planned,
            applied,
        })
    }

    /// Every known identifier with its applied state. Does not create the
    /// ledger: a missing table means nothing has been applied.
    pub async fn status(&self, scripts: &ScriptSet) -> MigrateResult<Vec<MigrationStatus>> {
        let entries = if self.ledger.exists().await? {
            self.ledger.entries().await?
        } else {
            Vec::new()
        };

        let mut rows: BTreeMap<MigrationId, MigrationStatus> = scripts
            .identifiers()
            .into_iter()
            .map(|id| {
                let status = MigrationStatus {
                    id,
                    label: scripts.label(id).unwrap_or_default().to_string(),
                    applied: false,
                    applied_at: None,
                    has_up: scripts.get(Direction::Up, id).is_some(),
                    has_down: scripts.get(Direction::Down, id).is_some(),
                    orphaned: false,
                };
                (id, status)
            })
            .collect();

        for entry in entries {
            let row = rows.entry(entry.id).or_insert_with(|| MigrationStatus {
                id: entry.id,
                label: entry.label.clone(),
                applied: false,
                applied_at: None,
                has_up: false,
                has_down: false,
                orphaned: true,
            });
            row.applied = true;
            row.applied_at = Some(entry.applied_at);
        }

        Ok(rows.into_values().collect())
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;

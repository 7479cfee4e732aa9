//! Migration planning.
//!
//! Turns the discovered scripts plus the set of applied identifiers into the
//! exact ordered list of migrations one invocation will execute.

use crate::migration_id::MigrationId;
use crate::script::{Direction, MigrationScript, ScriptSet};
use std::collections::BTreeSet;
use std::fmt;

/// Cap on how many migrations a single run may apply or revert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepLimit {
    /// Every candidate
    #[default]
    All,
    /// At most this many candidates
    AtMost(usize),
}

impl StepLimit {
    /// Interpret a signed step count: any negative value means no limit.
    pub fn from_signed(steps: i64) -> Self {
        usize::try_from(steps).map_or(StepLimit::All, StepLimit::AtMost)
    }

    fn cap(self) -> usize {
        match self {
            StepLimit::All => usize::MAX,
            StepLimit::AtMost(n) => n,
        }
    }
}

impl fmt::Display for StepLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepLimit::All => write!(f, "all"),
            StepLimit::AtMost(n) => write!(f, "{}", n),
        }
    }
}

/// A single SQL text to execute, named after the script it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// `<identifier>__<label>` of the originating script
    pub name: String,

    /// Raw SQL body
    pub value: String,
}

/// One logical migration step: its queries run as a single unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Ledger key
    pub id: MigrationId,

    /// Descriptive slug
    pub label: String,

    /// Whether executing this records or removes the ledger entry
    pub direction: Direction,

    /// Queries in execution order
    pub queries: Vec<Query>,
}

impl Migration {
    /// Build the execution unit for a single script
    pub fn from_script(script: &MigrationScript) -> Self {
        Self {
            id: script.id,
            label: script.label.clone(),
            direction: script.direction,
            queries: vec![Query {
                name: script.name(),
                value: script.body.clone(),
            }],
        }
    }

    /// `<identifier>__<label>`
    pub fn name(&self) -> String {
        format!("{}__{}", self.id, self.label)
    }
}

/// Ordered, immutable list of migrations for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    direction: Direction,
    migrations: Vec<Migration>,
}

impl Plan {
    /// Build a plan from already-ordered migrations
    pub fn new(direction: Direction, migrations: Vec<Migration>) -> Self {
        Self {
            direction,
            migrations,
        }
    }

    /// Direction every migration in the plan runs in
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Migrations in execution order
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Identifiers in execution order
    pub fn identifiers(&self) -> Vec<MigrationId> {
        self.migrations.iter().map(|m| m.id).collect()
    }

    /// Number of migrations
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Returns true when there is nothing to do
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

/// Compute the plan for `direction`.
///
/// - `Up`: up scripts not in `applied`, oldest first.
/// - `Down`: down scripts in `applied`, newest first.
///
/// `limit` truncates from the front of that order.
pub fn plan(
    direction: Direction,
    scripts: &ScriptSet,
    applied: &BTreeSet<MigrationId>,
    limit: StepLimit,
) -> Plan {
    let candidates = scripts.scripts(direction);

    let migrations: Vec<Migration> = match direction {
        Direction::Up => candidates
            .values()
            .filter(|s| !applied.contains(&s.id))
            .take(limit.cap())
            .map(Migration::from_script)
            .collect(),
        Direction::Down => candidates
            .values()
            .rev()
            .filter(|s| applied.contains(&s.id))
            .take(limit.cap())
            .map(Migration::from_script)
            .collect(),
    };

    log::debug!(
        "Planned {} {} migration(s) (limit: {})",
        migrations.len(),
        direction,
        limit
    );

    Plan::new(direction, migrations)
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;

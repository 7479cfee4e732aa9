//! Error types for the migration engine.

use dk_core::{DiscoveryIssue, MigrationId};
use dk_db::DbError;
use thiserror::Error;

/// Migration engine errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Discovery found problems that make planning unsafe (M001).
    #[error("[M001] Migration discovery failed: {}", join_issues(.0))]
    Discovery(Vec<DiscoveryIssue>),

    /// The ledger table could not be created or read (M002).
    #[error("[M002] Migration ledger '{table}' unavailable: {source}")]
    Ledger {
        table: String,
        #[source]
        source: DbError,
    },

    /// The ledger holds a value that is not a migration identifier (M003).
    #[error("[M003] Migration ledger '{table}' is corrupt: '{value}' is not a migration identifier")]
    CorruptLedger { table: String, value: String },

    /// A migration failed; earlier migrations in the plan stay committed (M004).
    #[error("[M004] Migration {name} failed ({applied} applied before it): {source}")]
    Execution {
        id: MigrationId,
        name: String,
        applied: usize,
        #[source]
        source: DbError,
    },

    /// The operator declined the destructive-run prompt (M005).
    #[error("[M005] Confirmation declined; no migrations were run")]
    ConfirmationDeclined,

    /// Reading the confirmation answer failed (M006).
    #[error("[M006] Confirmation prompt failed: {0}")]
    Prompt(#[from] std::io::Error),

    /// The configured ledger table name cannot be used in SQL (M007).
    #[error("[M007] Invalid ledger table name '{0}'")]
    InvalidLedgerTable(String),
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

fn join_issues(issues: &[DiscoveryIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl MigrateError {
    /// Number of migrations committed before this error stopped the run
    pub fn applied_count(&self) -> usize {
        match self {
            MigrateError::Execution { applied, .. } => *applied,
            _ => 0,
        }
    }
}

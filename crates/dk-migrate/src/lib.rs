//! dk-migrate - Migration engine for Deckard
//!
//! Ties the planner from `dk-core` to a `dk-db` connection: the ledger
//! table records what has been applied, the executor runs each migration
//! in its own transaction, and the gate asks before anything runs down.

pub mod error;
pub mod executor;
pub mod gate;
pub mod ledger;
pub mod migrator;

pub use error::{MigrateError, MigrateResult};
pub use executor::{execute, ExecutionFailure};
pub use gate::{AssumeYes, Confirmation, StdinPrompt};
pub use ledger::{Ledger, LedgerEntry, DEFAULT_LEDGER_TABLE};
pub use migrator::{checked_scripts, MigrationStatus, Migrator, MigratorOptions, RunReport};

//! dk-core - Core library for Deckard
//!
//! This crate provides migration identifiers, script discovery, planning,
//! migration file scaffolding and configuration parsing. It has no database
//! dependency: the planner works against a snapshot of applied identifiers.

pub mod config;
pub mod error;
pub mod migration_id;
pub mod plan;
pub mod scaffold;
pub mod script;

pub use config::{Config, DatabaseConfig, DbType, TargetConfig};
pub use error::{CoreError, CoreResult, DiscoveryIssue};
pub use migration_id::MigrationId;
pub use plan::{plan, Migration, Plan, Query, StepLimit};
pub use scaffold::{create_migration, validate_label, ScaffoldedMigration};
pub use script::{discover, Direction, Discovery, MigrationScript, ScriptSet};

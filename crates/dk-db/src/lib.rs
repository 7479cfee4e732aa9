//! dk-db - Database abstraction layer for Deckard
//!
//! This crate provides the `Database` trait and implementations for DuckDB
//! and PostgreSQL, plus [`connect`] to open whichever one a
//! [`DatabaseConfig`] names.

pub mod duckdb;
pub mod error;
pub mod postgres;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use postgres::PostgresBackend;
pub use traits::{quote_literal, Database};

use dk_core::{DatabaseConfig, DbType};
use std::sync::Arc;

/// Open a connection for the configured driver
pub async fn connect(config: &DatabaseConfig) -> DbResult<Arc<dyn Database>> {
    log::debug!("Connecting to {}", config.describe());
    let db: Arc<dyn Database> = match config.driver {
        DbType::DuckDb => Arc::new(DuckDbBackend::new(&config.path)?),
        DbType::Postgres => Arc::new(PostgresBackend::connect(config).await?),
    };
    Ok(db)
}

//! PostgreSQL database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{quote_literal, split_qualified, Database};
use async_trait::async_trait;
use dk_core::DatabaseConfig;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Executor, Row};
use tokio::sync::Mutex;

/// PostgreSQL backend over a single connection
pub struct PostgresBackend {
    conn: Mutex<PgConnection>,
}

impl PostgresBackend {
    /// Build connect options from the config.
    ///
    /// Unset fields fall back to libpq environment variables (`PGHOST`,
    /// `PGUSER`, ...) and then to `localhost:5432`.
    pub fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
        let mut options = PgConnectOptions::new();
        if let Some(host) = &config.host {
            options = options.host(host);
        }
        if let Some(port) = config.port {
            options = options.port(port);
        }
        if let Some(user) = &config.user {
            options = options.username(user);
        }
        if let Some(password) = &config.password {
            options = options.password(password);
        }
        if let Some(name) = &config.name {
            options = options.database(name);
        }
        options
    }

    /// Open a connection
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        let conn = PgConnection::connect_with(&Self::connect_options(config))
            .await
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", config.describe(), e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl Database for PostgresBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        let mut conn = self.conn.lock().await;
        let result = Executor::execute(&mut *conn, sqlx::raw_sql(sql))
            .await
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))?;
        Ok(result.rows_affected() as usize)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let mut conn = self.conn.lock().await;
        Executor::execute(&mut *conn, sqlx::raw_sql(sql)).await?;
        Ok(())
    }

    async fn execute_unit(&self, statements: &[String]) -> DbResult<()> {
        let mut conn = self.conn.lock().await;
        let mut tx = conn
            .begin()
            .await
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

        for sql in statements {
            // Dropping `tx` without commit rolls the transaction back
            Executor::execute(&mut *tx, sqlx::raw_sql(sql))
                .await
                .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(format!("COMMIT failed: {e}")))
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<String>>> {
        let mut conn = self.conn.lock().await;
        let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;

        rows.iter()
            .map(|row| {
                (0..row.len())
                    .map(|i| {
                        row.try_get::<Option<String>, _>(i)
                            .map(Option::unwrap_or_default)
                            .map_err(DbError::from)
                    })
                    .collect::<DbResult<Vec<String>>>()
            })
            .collect()
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let sql = relation_exists_sql(name);
        let mut conn = self.conn.lock().await;
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?;
        Ok(count > 0)
    }

    fn db_type(&self) -> &'static str {
        "postgres"
    }
}

/// Catalog lookup for an unquoted `name` or `schema.name`.
///
/// PostgreSQL folds unquoted identifiers to lower case, so the catalog holds
/// `schema_history` for a table created as `Schema_History`.
fn relation_exists_sql(name: &str) -> String {
    let (schema, table) = split_qualified(name);
    let schema_expr = schema.map_or_else(
        || "current_schema()".to_string(),
        |s| quote_literal(&s.to_ascii_lowercase()),
    );
    format!(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = {} AND table_name = {}",
        schema_expr,
        quote_literal(&table.to_ascii_lowercase())
    )
}

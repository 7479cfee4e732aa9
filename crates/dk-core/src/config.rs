//! Configuration types and parsing for deckard.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file names looked up in the project directory, in order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["deckard.yml", "deckard.yaml"];

/// Environment variable consulted when `--target` is not given
pub const TARGET_ENV_VAR: &str = "DECKARD_TARGET";

/// Project configuration from deckard.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding the migration scripts, relative to the project root
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// Table that records applied migrations
    #[serde(default = "default_ledger_table")]
    pub ledger_table: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Named target configurations (e.g., dev, staging, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            ledger_table: default_ledger_table(),
            database: DatabaseConfig::default(),
            targets: HashMap::new(),
        }
    }
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Migrations directory override
    #[serde(default)]
    pub migrations_dir: Option<String>,
}

/// Database driver selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
    /// PostgreSQL
    Postgres,
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::DuckDb => write!(f, "duckdb"),
            DbType::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for DbType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "duckdb" => Ok(DbType::DuckDb),
            "postgres" | "postgresql" => Ok(DbType::Postgres),
            other => Err(format!(
                "unknown database driver '{}' (expected duckdb or postgres)",
                other
            )),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Driver kind
    #[serde(default, alias = "type")]
    pub driver: DbType,

    /// Database file path for DuckDB, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Database name (server drivers)
    #[serde(default)]
    pub name: Option<String>,

    /// Server host
    #[serde(default)]
    pub host: Option<String>,

    /// Server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Login user
    #[serde(default)]
    pub user: Option<String>,

    /// Login password
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DbType::default(),
            path: default_db_path(),
            name: None,
            host: None,
            port: None,
            user: None,
            password: None,
        }
    }
}

impl DatabaseConfig {
    /// Human-readable description of where this config points, without the password
    pub fn describe(&self) -> String {
        match self.driver {
            DbType::DuckDb => format!("duckdb:{}", self.path),
            DbType::Postgres => format!(
                "postgres://{}@{}:{}/{}",
                self.user.as_deref().unwrap_or(""),
                self.host.as_deref().unwrap_or("localhost"),
                self.port.map_or_else(|| "5432".to_string(), |p| p.to_string()),
                self.name.as_deref().unwrap_or("")
            ),
        }
    }
}

const DEFAULT_DB_PATH: &str = ":memory:";

/// Ledger table used when the config names none
pub const DEFAULT_LEDGER_TABLE: &str = "deckard_migrations";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_migrations_dir() -> String {
    ".".to_string()
}

fn default_ledger_table() -> String {
    DEFAULT_LEDGER_TABLE.to_string()
}

/// Returns true for `name` or `schema.name` built from `[A-Za-z_][A-Za-z0-9_]*` parts.
///
/// The ledger table name is interpolated into SQL, so nothing else is allowed.
pub fn is_valid_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.is_empty() || parts.len() > 2 {
        return false;
    }
    parts.iter().all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    })
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for deckard.yml or deckard.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
            .map_or_else(
                || {
                    Err(CoreError::ConfigNotFound {
                        path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
                    })
                },
                |path| Self::load(&path),
            )
    }

    /// Like [`load_from_dir`](Self::load_from_dir), but a missing file yields defaults
    pub fn load_or_default(dir: &Path) -> CoreResult<Self> {
        match Self::load_from_dir(dir) {
            Err(CoreError::ConfigNotFound { path }) => {
                log::debug!("No config file at {}, using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.migrations_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations_dir cannot be empty".to_string(),
            });
        }

        if !is_valid_table_name(&self.ledger_table) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "ledger_table '{}' must be a plain SQL identifier, optionally schema-qualified",
                    self.ledger_table
                ),
            });
        }

        Ok(())
    }

    /// Get the list of available target names, sorted
    pub fn available_targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    fn get_target(&self, name: &str) -> CoreResult<&TargetConfig> {
        self.targets
            .get(name)
            .ok_or_else(|| CoreError::UnknownTarget {
                name: name.to_string(),
                available: self.available_targets().join(", "),
            })
    }

    /// Get database configuration, optionally applying target overrides
    pub fn get_database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        match target {
            Some(name) => Ok(self
                .get_target(name)?
                .database
                .clone()
                .unwrap_or_else(|| self.database.clone())),
            None => Ok(self.database.clone()),
        }
    }

    /// Get the migrations directory, optionally applying target overrides
    pub fn get_migrations_dir(&self, target: Option<&str>) -> CoreResult<&str> {
        match target {
            Some(name) => Ok(self
                .get_target(name)?
                .migrations_dir
                .as_deref()
                .unwrap_or(&self.migrations_dir)),
            None => Ok(&self.migrations_dir),
        }
    }

    /// Resolve the migrations directory against a project root
    pub fn migrations_dir_absolute(&self, root: &Path, target: Option<&str>) -> CoreResult<PathBuf> {
        Ok(root.join(self.get_migrations_dir(target)?))
    }

    /// Resolve target from CLI flag or DECKARD_TARGET environment variable
    ///
    /// Priority: CLI flag > DECKARD_TARGET env var > None
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use dk_core::{discover, Config, DatabaseConfig, DbType, ScriptSet};
use dk_db::Database;
use dk_migrate::{checked_scripts, MigrateError, Migrator, MigratorOptions};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::{DbArgs, GlobalArgs};

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and the database connection closes cleanly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Empty: the failure was already reported before this was returned
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Discovery or configuration problems
pub(crate) const EXIT_USAGE: i32 = 1;

/// Database, ledger or execution failures
pub(crate) const EXIT_DATABASE: i32 = 4;

/// Config file plus the resolved target for one invocation
#[derive(Debug)]
pub(crate) struct Settings {
    pub root: PathBuf,
    pub config: Config,
    pub target: Option<String>,
}

/// Load `deckard.yml` from the project directory, falling back to defaults
pub(crate) fn load_settings(global: &GlobalArgs) -> Result<Settings> {
    let config =
        Config::load_or_default(&global.project_dir).context("Failed to load deckard config")?;
    let target = Config::resolve_target(global.target.as_deref());
    if let Some(name) = &target {
        log::debug!("Using target '{}'", name);
    }
    Ok(Settings {
        root: global.project_dir.clone(),
        config,
        target,
    })
}

impl Settings {
    /// An explicit directory wins and is used as given; otherwise the
    /// configured `migrations_dir`, relative to the project directory.
    pub(crate) fn migrations_dir(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(dir) => Ok(dir.to_path_buf()),
            None => self
                .config
                .migrations_dir_absolute(&self.root, self.target.as_deref())
                .context("Failed to resolve migrations directory"),
        }
    }

    /// Config-file connection settings with CLI/env overrides applied.
    ///
    /// A relative DuckDB path from the config file is taken relative to the
    /// project directory; one given on the command line is used as given.
    pub(crate) fn database_config(&self, overrides: &DbArgs) -> Result<DatabaseConfig> {
        let mut db = self
            .config
            .get_database_config(self.target.as_deref())
            .context("Failed to get database configuration")?;

        if db.driver == DbType::DuckDb && db.path != ":memory:" && Path::new(&db.path).is_relative()
        {
            db.path = self.root.join(&db.path).to_string_lossy().into_owned();
        }

        overrides.apply(&mut db);
        Ok(db)
    }

    pub(crate) fn migrator_options(&self) -> MigratorOptions {
        MigratorOptions {
            ledger_table: self.config.ledger_table.clone(),
        }
    }
}

impl DbArgs {
    /// Overwrite every field that was given on the command line or via env
    pub(crate) fn apply(&self, db: &mut DatabaseConfig) {
        if let Some(driver) = self.driver {
            db.driver = driver;
        }
        if let Some(path) = &self.path {
            db.path = path.clone();
        }
        if let Some(name) = &self.name {
            db.name = Some(name.clone());
        }
        if let Some(host) = &self.host {
            db.host = Some(host.clone());
        }
        if let Some(port) = self.port {
            db.port = Some(port);
        }
        if let Some(user) = &self.user {
            db.user = Some(user.clone());
        }
        if let Some(password) = &self.password {
            db.password = Some(password.clone());
        }
    }
}

/// Open the configured database, reporting failures with the database exit code
pub(crate) async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn Database>> {
    match dk_db::connect(config).await {
        Ok(db) => Ok(db),
        Err(e) => {
            eprintln!("Error: could not connect to {}: {}", config.describe(), e);
            Err(ExitCode(EXIT_DATABASE).into())
        }
    }
}

/// Scan a migrations directory. Duplicate identifiers stop the command;
/// other issues were already logged as warnings during the scan.
pub(crate) fn load_scripts(dir: &Path) -> Result<ScriptSet> {
    let discovery = discover(dir)
        .with_context(|| format!("Failed to read migrations from {}", dir.display()))?;

    match checked_scripts(&discovery) {
        Ok(scripts) => {
            log::debug!("Found {} migration(s) in {}", scripts.len(), dir.display());
            Ok(scripts.clone())
        }
        Err(err) => Err(report_migrate_error(err)),
    }
}

/// Build the engine for a connection, validating the ledger table name
pub(crate) fn build_migrator(db: Arc<dyn Database>, settings: &Settings) -> Result<Migrator> {
    Migrator::new(db, settings.migrator_options()).map_err(report_migrate_error)
}

/// Print an engine error and turn it into the matching exit code
pub(crate) fn report_migrate_error(err: MigrateError) -> anyhow::Error {
    match &err {
        MigrateError::Discovery(issues) => {
            eprintln!("Error: migration files conflict:");
            for issue in issues {
                eprintln!("  {}", issue);
            }
            ExitCode(EXIT_USAGE).into()
        }
        MigrateError::InvalidLedgerTable(_) => {
            eprintln!("Error: {}", err);
            ExitCode(EXIT_USAGE).into()
        }
        MigrateError::Execution {
            name,
            applied,
            source,
            ..
        } => {
            eprintln!("  \u{2717} {}: {}", name, source);
            eprintln!();
            eprintln!(
                "Migration {} failed; {} migration(s) applied before the failure",
                name, applied
            );
            ExitCode(EXIT_DATABASE).into()
        }
        _ => {
            eprintln!("Error: {}", err);
            ExitCode(EXIT_DATABASE).into()
        }
    }
}

/// Left-aligned columns separated by two spaces, with a dashed rule under
/// the header.
pub(crate) fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<w$}", cell))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(headers.iter().map(|h| h.to_string()).collect()));
    out.push(line(widths.iter().map(|&w| "-".repeat(w)).collect()));
    out.extend(rows.iter().map(|row| line(row.clone())));
    out.join("\n")
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;

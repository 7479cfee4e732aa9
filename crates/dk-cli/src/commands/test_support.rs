//! Fixtures shared by command tests

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::cli::{DbArgs, GlobalArgs};

/// Project dir with a `migrations/` folder and a DuckDB file, so state
/// survives across command invocations
pub(crate) struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("migrations")).unwrap();
        fs::write(
            dir.path().join("deckard.yml"),
            "migrations_dir: migrations\ndatabase:\n  driver: duckdb\n  path: app.duckdb\n",
        )
        .unwrap();
        Self { dir }
    }

    pub(crate) fn root(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn migrations(&self) -> std::path::PathBuf {
        self.root().join("migrations")
    }

    pub(crate) fn write_pair(&self, id: u64, table: &str) {
        let dir = self.migrations();
        fs::write(
            dir.join(format!("{id}__create_{table}.up.sql")),
            format!("CREATE TABLE {table} (id INT);"),
        )
        .unwrap();
        fs::write(
            dir.join(format!("{id}__create_{table}.down.sql")),
            format!("DROP TABLE {table};"),
        )
        .unwrap();
    }

    pub(crate) fn global(&self) -> GlobalArgs {
        GlobalArgs {
            verbose: false,
            project_dir: self.root().to_path_buf(),
            target: None,
            db: DbArgs::default(),
        }
    }

    /// Open the project database directly to inspect what commands did
    pub(crate) fn database(&self) -> dk_db::DuckDbBackend {
        dk_db::DuckDbBackend::from_path(&self.root().join("app.duckdb")).unwrap()
    }
}

//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use dk_core::DbType;
use std::path::PathBuf;

/// Deckard - timestamped SQL migrations, up and down
#[derive(Parser, Debug)]
#[command(name = "deckard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding deckard.yml
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Named target from deckard.yml
    #[arg(short, long, global = true)]
    pub target: Option<String>,

    /// Database connection overrides
    #[command(flatten)]
    pub db: DbArgs,
}

/// Connection settings that override the config file
#[derive(Args, Debug, Clone, Default)]
pub struct DbArgs {
    /// Database driver (duckdb or postgres)
    #[arg(long = "db-driver", env = "DECKARD_DB_DRIVER", global = true)]
    pub driver: Option<DbType>,

    /// DuckDB file path, or :memory:
    #[arg(long = "db-path", env = "DECKARD_DB_PATH", global = true)]
    pub path: Option<String>,

    /// Database name
    #[arg(long = "db-name", env = "DECKARD_DB_NAME", global = true)]
    pub name: Option<String>,

    /// Database host
    #[arg(long = "db-host", env = "DECKARD_DB_HOST", global = true)]
    pub host: Option<String>,

    /// Database port
    #[arg(long = "db-port", env = "DECKARD_DB_PORT", global = true)]
    pub port: Option<u16>,

    /// Database user
    #[arg(long = "db-user", env = "DECKARD_DB_USER", global = true)]
    pub user: Option<String>,

    /// Database password
    #[arg(
        long = "db-password",
        env = "DECKARD_DB_PASSWORD",
        global = true,
        hide_env_values = true
    )]
    pub password: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migrations, oldest first
    Up(UpArgs),

    /// Revert applied migrations, newest first
    Down(DownArgs),

    /// Scaffold an empty up/down migration pair
    Create(CreateArgs),

    /// Show applied and pending migrations
    Status(StatusArgs),
}

/// Arguments for the up command
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Number of migrations to apply (negative means all)
    #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
    pub steps: i64,

    /// Directory to read migrations from (default: migrations_dir from config)
    #[arg(short, long)]
    pub input_dir: Option<PathBuf>,

    /// Print the plan without executing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the down command
#[derive(Args, Debug)]
pub struct DownArgs {
    /// Number of migrations to revert (negative means all)
    #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
    pub steps: i64,

    /// Directory to read migrations from (default: migrations_dir from config)
    #[arg(short, long)]
    pub input_dir: Option<PathBuf>,

    /// Print the plan without executing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the create command
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Descriptive label, e.g. add_users_table
    pub label: String,

    /// Directory to write the pair into (default: migrations_dir from config)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Directory to read migrations from (default: migrations_dir from config)
    #[arg(short, long)]
    pub input_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// Human-readable table
    Table,
    /// JSON array
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

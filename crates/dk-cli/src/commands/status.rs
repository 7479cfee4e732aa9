//! Status command implementation

use anyhow::{Context, Result};
use dk_migrate::MigrationStatus;
use serde::Serialize;

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::{
    build_migrator, connect, load_scripts, load_settings, render_table, report_migrate_error,
};

/// One migration as printed by `status --output json`
#[derive(Debug, Serialize)]
pub(crate) struct StatusRow {
    pub identifier: String,
    pub label: String,
    pub state: &'static str,
    pub applied_at: Option<String>,
    pub has_down: bool,
}

impl From<&MigrationStatus> for StatusRow {
    fn from(status: &MigrationStatus) -> Self {
        let state = match (status.applied, status.orphaned) {
            (_, true) => "orphaned",
            (true, false) => "applied",
            (false, false) => "pending",
        };
        Self {
            identifier: status.id.to_string(),
            label: status.label.clone(),
            state,
            applied_at: status.applied_at.clone(),
            has_down: status.has_down,
        }
    }
}

/// Table form of the status rows
pub(crate) fn format_status_table(rows: &[StatusRow]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.identifier.clone(),
                row.label.clone(),
                row.state.to_string(),
                row.applied_at.clone().unwrap_or_else(|| "-".to_string()),
                if row.has_down { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    render_table(&["IDENTIFIER", "LABEL", "STATE", "APPLIED AT", "DOWN"], &cells)
}

/// Counts per state; orphaned rows are not counted as applied
pub(crate) fn summary_line(statuses: &[MigrationStatus]) -> String {
    let applied = statuses.iter().filter(|s| s.applied && !s.orphaned).count();
    let pending = statuses.iter().filter(|s| !s.applied).count();
    let orphaned = statuses.iter().filter(|s| s.orphaned).count();
    format!("{applied} applied, {pending} pending, {orphaned} orphaned")
}

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let settings = load_settings(global)?;
    let dir = settings.migrations_dir(args.input_dir.as_deref())?;
    let scripts = load_scripts(&dir)?;
    let db = connect(&settings.database_config(&global.db)?).await?;
    let migrator = build_migrator(db, &settings)?;

    let statuses = migrator
        .status(&scripts)
        .await
        .map_err(report_migrate_error)?;
    let rows: Vec<StatusRow> = statuses.iter().map(StatusRow::from).collect();

    match args.output {
        StatusOutput::Json => {
            let json = serde_json::to_string_pretty(&rows).context("Failed to serialize status")?;
            println!("{}", json);
        }
        StatusOutput::Table => {
            if rows.is_empty() {
                println!("No migrations found in {}", dir.display());
                return Ok(());
            }
            println!("{}", format_status_table(&rows));

            println!();
            println!("{}", summary_line(&statuses));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;

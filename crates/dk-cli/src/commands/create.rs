//! Create command implementation

use anyhow::{Context, Result};
use chrono::Utc;
use dk_core::{create_migration, MigrationId};

use crate::cli::{CreateArgs, GlobalArgs};
use crate::commands::common::load_settings;

/// Execute the create command, stamping the pair with the current time
pub async fn execute(args: &CreateArgs, global: &GlobalArgs) -> Result<()> {
    create_with_id(args, global, MigrationId::from_timestamp(Utc::now()))
}

pub(crate) fn create_with_id(
    args: &CreateArgs,
    global: &GlobalArgs,
    id: MigrationId,
) -> Result<()> {
    let settings = load_settings(global)?;
    let dir = settings.migrations_dir(args.output_dir.as_deref())?;

    let created = create_migration(&dir, &args.label, id)
        .with_context(|| format!("Failed to create migration '{}'", args.label))?;

    println!("Created migration {}__{}", created.id, created.label);
    println!("  {}", created.up_path.display());
    println!("  {}", created.down_path.display());
    Ok(())
}

#[cfg(test)]
#[path = "create_test.rs"]
mod tests;

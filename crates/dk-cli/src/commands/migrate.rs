//! Shared up/down flow: load scripts, connect, plan, confirm, execute

use anyhow::Result;
use dk_core::{Direction, Plan, StepLimit};
use dk_migrate::{Confirmation, MigrateError};
use std::path::Path;

use crate::cli::GlobalArgs;
use crate::commands::common::{
    build_migrator, connect, load_scripts, load_settings, report_migrate_error,
};

/// What one `up`/`down` invocation asked for
pub(crate) struct RunRequest<'a> {
    pub direction: Direction,
    pub steps: i64,
    pub input_dir: Option<&'a Path>,
    pub dry_run: bool,
}

fn print_plan(plan: &Plan) {
    for migration in plan.migrations() {
        println!("  {}", migration.name());
    }
}

fn verb(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "apply",
        Direction::Down => "revert",
    }
}

/// Run migrations in one direction
pub(crate) async fn run(
    request: RunRequest<'_>,
    gate: &mut dyn Confirmation,
    global: &GlobalArgs,
) -> Result<()> {
    let settings = load_settings(global)?;
    let dir = settings.migrations_dir(request.input_dir)?;
    let scripts = load_scripts(&dir)?;
    let db_config = settings.database_config(&global.db)?;
    let limit = StepLimit::from_signed(request.steps);

    if global.verbose {
        println!(
            "Migrations: {} ({} script(s)), database: {}, steps: {}",
            dir.display(),
            scripts.len(),
            db_config.describe(),
            limit
        );
    }

    let db = connect(&db_config).await?;
    let migrator = build_migrator(db, &settings)?;

    if request.dry_run {
        let plan = migrator
            .plan_only(&scripts, request.direction, limit)
            .await
            .map_err(report_migrate_error)?;
        if plan.is_empty() {
            println!("Dry run - nothing to {}", verb(request.direction));
        } else {
            println!(
                "Dry run - would {} {} {} migration(s):",
                verb(request.direction),
                plan.len(),
                request.direction
            );
            print_plan(&plan);
        }
        return Ok(());
    }

    let report = match migrator
        .run(&scripts, request.direction, limit, gate)
        .await
    {
        Ok(report) => report,
        Err(MigrateError::ConfirmationDeclined) => {
            println!("Understood! Aborting...");
            return Ok(());
        }
        Err(err) => return Err(report_migrate_error(err)),
    };

    if report.planned.is_empty() {
        match report.direction {
            Direction::Up => println!("No pending migrations"),
            Direction::Down => println!("No applied migrations to revert"),
        }
        return Ok(());
    }

    for migration in report.planned.migrations() {
        println!("  \u{2713} {}", migration.name());
    }
    println!();
    match report.direction {
        Direction::Up => println!("Applied {} migration(s)", report.applied),
        Direction::Down => println!("Reverted {} migration(s)", report.applied),
    }
    Ok(())
}

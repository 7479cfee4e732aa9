//! Up command implementation

use anyhow::Result;
use dk_core::Direction;
use dk_migrate::AssumeYes;

use crate::cli::{GlobalArgs, UpArgs};
use crate::commands::migrate::{self, RunRequest};

/// Execute the up command. Applying never prompts.
pub async fn execute(args: &UpArgs, global: &GlobalArgs) -> Result<()> {
    let request = RunRequest {
        direction: Direction::Up,
        steps: args.steps,
        input_dir: args.input_dir.as_deref(),
        dry_run: args.dry_run,
    };
    migrate::run(request, &mut AssumeYes, global).await
}

#[cfg(test)]
#[path = "up_test.rs"]
mod tests;

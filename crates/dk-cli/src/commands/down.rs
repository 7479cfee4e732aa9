//! Down command implementation

use anyhow::Result;
use dk_core::Direction;
use dk_migrate::{AssumeYes, Confirmation, StdinPrompt};

use crate::cli::{DownArgs, GlobalArgs};
use crate::commands::migrate::{self, RunRequest};

/// Execute the down command, asking on stdin unless `--yes` was given
pub async fn execute(args: &DownArgs, global: &GlobalArgs) -> Result<()> {
    if args.yes {
        execute_with(args, global, &mut AssumeYes).await
    } else {
        execute_with(args, global, &mut StdinPrompt::new()).await
    }
}

pub(crate) async fn execute_with(
    args: &DownArgs,
    global: &GlobalArgs,
    gate: &mut dyn Confirmation,
) -> Result<()> {
    let request = RunRequest {
        direction: Direction::Down,
        steps: args.steps,
        input_dir: args.input_dir.as_deref(),
        dry_run: args.dry_run,
    };
    migrate::run(request, gate, global).await
}

#[cfg(test)]
#[path = "down_test.rs"]
mod tests;

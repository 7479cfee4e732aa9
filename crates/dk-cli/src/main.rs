//! Deckard CLI - timestamped SQL migrations for DuckDB and PostgreSQL

use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::common::{ExitCode, EXIT_USAGE};
use commands::{create, down, status, up};

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_target(false)
        .format_timestamp(None)
        .init();
}

async fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        cli::Commands::Up(args) => up::execute(args, &cli.global).await,
        cli::Commands::Down(args) => down::execute(args, &cli.global).await,
        cli::Commands::Create(args) => create::execute(args, &cli.global).await,
        cli::Commands::Status(args) => status::execute(args, &cli.global).await,
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match dispatch(&cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            let code = match err.downcast_ref::<ExitCode>() {
                Some(ExitCode(code)) => *code,
                None => {
                    eprintln!("Error: {:#}", err);
                    EXIT_USAGE
                }
            };
            std::process::ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

//! teamcost - Shared team cost-cache coordinator
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use std::process::ExitCode;

use clap::Parser;

use teamcost::cli::{self, AppContext, Cli, Commands};
use teamcost::core::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = cli
        .log_level
        .as_deref()
        .and_then(logging::LogLevel::from_arg)
        .or_else(logging::level_from_env)
        .unwrap_or_default();
    let log_format = logging::format_from_env().unwrap_or_default();
    let log_file = logging::log_file_from_env();
    logging::init(log_level, log_format, log_file, cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> teamcost::Result<()> {
    let ctx = AppContext::build(&cli)?;
    match &cli.command {
        Commands::Status(args) => cli::status::execute(&ctx, args).await,
        Commands::Refresh(args) => cli::refresh::execute(&ctx, args).await,
        Commands::Run => cli::run::execute(&ctx).await,
        Commands::Audit(args) => cli::audit::execute(&ctx, args).await,
    }
}

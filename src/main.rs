//! Sherpa: intent-routed workflow orchestrator plugin core.
//!
//! This is the main entry point for the `sherpa` CLI. It installs the
//! tracing subscriber, parses arguments, dispatches to the appropriate
//! command handler, and handles errors with proper exit codes.

use sherpa::cli::Cli;
use sherpa::{commands, exit_codes};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sherpa=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    match commands::dispatch(cli.command).await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            ExitCode::from(err.exit_code() as u8)
        }
    }
}

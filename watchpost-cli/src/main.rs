//! Watchpost CLI entry point
//!
//! Parses arguments, initialises logging, and dispatches to the subcommand
//! handlers. Failures map to process exit codes via [`CliError::exit_code`].

mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_deref());

    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    let config_path = cli.config;

    match cli.command {
        Commands::Status(args) => commands::status::execute(args, &config_path, &writer).await,
        Commands::Import(args) => commands::import::execute(args, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &config_path, &writer).await,
    }
}

/// Initialise tracing for CLI runs.
///
/// Logs go to stderr so stdout stays parseable in `--output json` mode.
/// An explicit `--log-level` wins over `RUST_LOG`; the default is `warn`.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

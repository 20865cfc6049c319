//! Declarative clap surface for the `watchpost` binary.
//!
//! Parsing stays free of side effects, so the whole tree can be
//! exercised with `try_parse_from` in tests.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Watchpost -- Suricata alert streaming for dashboards.
///
/// Run `watchpost <COMMAND> --help` for the flags of each subcommand.
#[derive(Parser, Debug)]
#[command(name = "watchpost", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "watchpost.toml")]
    pub config: PathBuf,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// How results are printed.
    #[arg(long, global = true, value_name = "FORMAT", default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Rendering mode for command results.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Tables and key/value lines for humans.
    Text,
    /// Pretty-printed JSON for scripts.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check daemon liveness and module status.
    Status(StatusArgs),

    /// Import an eve.json capture file and print the normalized alerts.
    Import(ImportArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- status ----

/// Report whether the daemon runs and which modules it carries.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Include per-module configuration details.
    #[arg(short, long)]
    pub verbose: bool,
}

// ---- import ----

/// Replay a capture (NDJSON or a single JSON array) through the
/// normalization path.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Capture file to read.
    pub file: PathBuf,

    /// Cap on alerts shown in text output, 0 lifts the cap.
    #[arg(long, value_name = "N", default_value_t = 20)]
    pub limit: usize,
}

// ---- config ----

/// Inspect or validate watchpost configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Check the configuration file and list every violation.
    Validate,
    /// Print the effective configuration after file, environment, and
    /// default merging.
    Show {
        /// Restrict output to one section (general, eve, stream, metrics).
        #[arg(long, value_name = "NAME")]
        section: Option<String>,
    },
}

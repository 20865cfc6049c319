//! Command-line interface of the daemon binary.
//!
//! Parsed with `clap` derive. Overrides given here win over both the
//! config file and environment variables.

use std::path::PathBuf;

use clap::Parser;

/// Streams Suricata alerts from eve.json to dashboard sessions.
#[derive(Parser, Debug)]
#[command(name = "watchpost-daemon", version, about, long_about = None)]
pub struct DaemonCli {
    /// Configuration file to load.
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "/etc/watchpost/watchpost.toml"
    )]
    pub config: PathBuf,

    /// Check the configuration and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log format override (json, pretty).
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<String>,

    /// Pid file path override.
    #[arg(long, value_name = "PATH")]
    pub pid_file: Option<String>,
}

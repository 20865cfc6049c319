//! Tracing setup for the daemon.
//!
//! The `[general]` section of `watchpost.toml` selects the log level and
//! the output format. A `RUST_LOG` environment variable, when present,
//! takes precedence over the configured level.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use watchpost_core::config::GeneralConfig;

/// Install the global tracing subscriber.
///
/// Call once at process start, before the first tracing macro runs. The
/// `log_format` field picks between `"json"` (one machine-readable line
/// per event) and `"pretty"` (indented output for a terminal).
///
/// # Errors
///
/// Fails when `log_format` holds an unknown value or when a subscriber
/// has already been installed.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        "pretty" => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
        other => anyhow::bail!("unknown log format '{}', expected 'json' or 'pretty'", other),
    };
    installed.context("failed to set global tracing subscriber")
}

//! `watchpost config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use watchpost_core::config::WatchpostConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Load the configuration and report whether it passes validation.
///
/// # Errors
///
/// Returns `CliError::Config` when the file cannot be loaded or fails
/// validation. The detailed reasons land in the rendered report.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let errors = match WatchpostConfig::load(config_path).await {
        Ok(_) => Vec::new(),
        Err(e) => vec![e.to_string()],
    };
    let report = ConfigValidationReport {
        source: config_path.display().to_string(),
        valid: errors.is_empty(),
        errors,
    };
    writer.render(&report)?;

    if report.valid {
        Ok(())
    } else {
        Err(CliError::Config("configuration is invalid".to_owned()))
    }
}

/// Show the effective configuration (file, env overrides, defaults).
///
/// # Errors
///
/// Returns `CliError::Core` when loading fails and `CliError::Command`
/// for an unknown section name.
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = WatchpostConfig::load(config_path).await?;
    let config_toml = match &section {
        Some(name) => section_toml(&config, name)?,
        None => render_toml(&config),
    };

    writer.render(&ConfigReport {
        source: config_path.display().to_string(),
        section,
        config_toml,
    })?;
    Ok(())
}

fn render_toml<T: Serialize>(value: &T) -> String {
    toml::to_string_pretty(value).unwrap_or_else(|e| format!("(serialization error: {})", e))
}

fn section_toml(config: &WatchpostConfig, section: &str) -> Result<String, CliError> {
    let toml = match section {
        "general" => render_toml(&config.general),
        "eve" => render_toml(&config.eve),
        "stream" => render_toml(&config.stream),
        "metrics" => render_toml(&config.metrics),
        other => {
            return Err(CliError::Command(format!(
                "unknown section: {other} (expected: general, eve, stream, metrics)"
            )));
        }
    };
    Ok(toml)
}

/// Effective configuration, ready to print.
///
/// `config_toml` is text-only; JSON output carries just the source and
/// the selected section.
#[derive(Serialize)]
pub struct ConfigReport {
    /// Configuration file path.
    pub source: String,
    /// Section name, or `None` for the whole file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Serialized TOML of the selected part.
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.section {
            Some(section) => {
                let label = format!("[{section}]");
                writeln!(
                    w,
                    "Configuration {} (source: {})",
                    label.bold(),
                    self.source
                )?;
            }
            None => writeln!(w, "Configuration (source: {})", self.source.bold())?,
        }
        writeln!(w)?;
        write!(w, "{}", self.config_toml)
    }
}

/// Outcome of `config validate`.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path.
    pub source: String,
    /// Whether the file loaded and validated.
    pub valid: bool,
    /// Reasons for rejection, empty when valid.
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config check: {}", self.source.bold())?;
        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            self.errors
                .iter()
                .try_for_each(|err| writeln!(w, "  Error: {}", err.red()))
        }
    }
}

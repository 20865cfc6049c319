//! `watchpost status` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use watchpost_core::config::WatchpostConfig;

use crate::cli::StatusArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `status` command.
///
/// Renders daemon liveness and the per-module view derived from the
/// configuration. When no running daemon process is found the command
/// exits with code 3 (via [`CliError::DaemonUnavailable`]), matching
/// the LSB convention for "program is not running".
pub async fn execute(
    args: StatusArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = WatchpostConfig::load(config_path).await?;
    let report = build_status_report(&config, args.verbose);
    writer.render(&report)?;

    if report.daemon_running {
        Ok(())
    } else {
        Err(CliError::DaemonUnavailable(format!(
            "no running daemon process (pid file: {})",
            config.general.pid_file
        )))
    }
}

fn build_status_report(config: &WatchpostConfig, verbose: bool) -> StatusReport {
    let (daemon_running, uptime_secs) = probe_daemon(&config.general.pid_file);
    let health = if daemon_running { "running" } else { "stopped" };

    let mut modules = Vec::new();
    if config.eve.enabled {
        let details = verbose.then(|| {
            format!(
                "log_path={}, poll_interval={}ms",
                config.eve.log_path, config.eve.poll_interval_ms
            )
        });
        modules.push(ModuleStatus::new("eve-pipeline", health, details));
    }
    if config.stream.enabled {
        let details = verbose.then(|| {
            format!(
                "bind={}, flush_interval={}ms",
                config.stream.bind, config.stream.flush_interval_ms
            )
        });
        modules.push(ModuleStatus::new("stream-gateway", health, details));
    }

    StatusReport {
        daemon_running,
        uptime_secs,
        modules,
    }
}

/// Determine daemon liveness from its pid file.
///
/// Uptime cannot be derived from the pid file alone; the daemon
/// publishes it through the Prometheus endpoint instead, so the second
/// element is always `None` here.
fn probe_daemon(pid_file: &str) -> (bool, Option<u64>) {
    (read_live_pid(pid_file).is_some(), None)
}

/// Read the pid file and return the pid when that process is alive.
fn read_live_pid(pid_file: &str) -> Option<u32> {
    let path = Path::new(pid_file);
    if !path.exists() {
        debug!(pid_file, "pid file does not exist");
        return None;
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(pid_file, error = %e, "failed to read pid file");
            return None;
        }
    };
    let Ok(pid) = content.trim().parse::<u32>() else {
        warn!(pid_file, content = %content.trim(), "pid file holds no valid pid");
        return None;
    };

    process_alive(pid).then_some(pid)
}

/// Probe for process existence without delivering a signal.
#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    use std::io::ErrorKind;

    // SAFETY: kill with signal 0 sends nothing, the call only performs
    // the existence and permission checks.
    if unsafe { libc::kill(pid as libc::pid_t, 0) } == 0 {
        return true;
    }
    // EPERM still proves the process exists.
    std::io::Error::last_os_error().kind() == ErrorKind::PermissionDenied
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    warn!("process liveness probe not supported on this platform");
    false
}

#[derive(Serialize)]
pub struct StatusReport {
    pub daemon_running: bool,
    pub uptime_secs: Option<u64>,
    pub modules: Vec<ModuleStatus>,
}

#[derive(Serialize)]
pub struct ModuleStatus {
    pub name: String,
    pub enabled: bool,
    pub health: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ModuleStatus {
    /// Only enabled modules are reported, so `enabled` is fixed here.
    fn new(name: &str, health: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_owned(),
            enabled: true,
            health: health.to_owned(),
            details,
        }
    }
}

impl Render for StatusReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match (self.daemon_running, self.uptime_secs) {
            (true, Some(secs)) => {
                writeln!(w, "Daemon: {} (uptime: {secs}s)", "running".green().bold())?;
            }
            (true, None) => {
                writeln!(w, "Daemon: {} (uptime: unknown)", "running".green().bold())?;
            }
            (false, _) => writeln!(w, "Daemon: {}", "not running".red().bold())?,
        }

        writeln!(w)?;
        writeln!(w, "{:<20} {:<10} Health", "Module", "Enabled")?;
        writeln!(w, "{}", "-".repeat(60))?;

        for module in &self.modules {
            let enabled = if module.enabled { "yes" } else { "no" };
            let health = match module.health.as_str() {
                "running" => module.health.green(),
                "stopped" => module.health.yellow(),
                _ => module.health.normal(),
            };
            writeln!(w, "{:<20} {:<10} {}", module.name, enabled, health)?;
            if let Some(details) = &module.details {
                writeln!(w, "  {}", details.dimmed())?;
            }
        }
        Ok(())
    }
}

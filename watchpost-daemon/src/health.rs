//! Daemon-wide health aggregation.
//!
//! Every registered module answers `health_check()` on its own. This
//! module folds those answers into a single [`DaemonHealth`] report
//! where the daemon carries the worst status among enabled modules.

use serde::Serialize;

use watchpost_core::plugin::HealthStatus;

/// Health report for the daemon as a whole.
#[derive(Debug, Clone, Serialize)]
pub struct DaemonHealth {
    /// Worst status among enabled modules.
    pub status: HealthStatus,
    /// Seconds since the daemon process started.
    pub uptime_secs: u64,
    /// One entry per registered module.
    pub modules: Vec<ModuleHealth>,
}

/// Health entry for one module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleHealth {
    /// Module name as reported by its plugin info.
    pub name: String,
    /// Whether the module is enabled in the daemon configuration.
    pub enabled: bool,
    /// Status the module reported for itself.
    pub status: HealthStatus,
}

/// Fold per-module statuses into one, taking the worst level present.
///
/// Unhealthy outranks Degraded, which outranks Healthy. Disabled
/// modules are skipped. The returned reason lists every module at the
/// winning level as `name: reason`, joined with `; `.
pub fn aggregate_status(modules: &[ModuleHealth]) -> HealthStatus {
    let mut degraded = Vec::new();
    let mut unhealthy = Vec::new();

    for module in modules.iter().filter(|m| m.enabled) {
        match &module.status {
            HealthStatus::Healthy => {}
            HealthStatus::Degraded(reason) => {
                degraded.push(format!("{}: {}", module.name, reason));
            }
            HealthStatus::Unhealthy(reason) => {
                unhealthy.push(format!("{}: {}", module.name, reason));
            }
        }
    }

    if !unhealthy.is_empty() {
        HealthStatus::Unhealthy(unhealthy.join("; "))
    } else if !degraded.is_empty() {
        HealthStatus::Degraded(degraded.join("; "))
    } else {
        HealthStatus::Healthy
    }
}

//! Daemon assembly and lifecycle.
//!
//! The [`Orchestrator`] owns the daemon's runtime state: the validated
//! configuration and the plugin registry. Building it wires the channels
//! between modules; running it starts the plugins and blocks until a
//! shutdown signal arrives.
//!
//! Startup runs producers before consumers, and shutdown uses the same
//! order:
//!
//! 1. Eve pipeline (produces alert events from the tailed log)
//! 2. Stream gateway (consumes alert events and fans them out to sessions)
//!
//! Stopping the pipeline first silences the alert channel, which lets the
//! gateway flush buffered alerts before its sessions close.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};

use watchpost_core::config::WatchpostConfig;
use watchpost_core::event::{AlertEvent, RawEvent};
use watchpost_core::plugin::PluginRegistry;

use crate::health::{DaemonHealth, ModuleHealth, aggregate_status};
use crate::metrics_server;

/// Depth of the pipeline-to-gateway alert channel.
const ALERT_CHANNEL_CAPACITY: usize = 256;
/// Depth of the gateway-to-pipeline submission channel.
const SUBMISSION_CHANNEL_CAPACITY: usize = 1024;

/// Central coordinator for the daemon process.
///
/// Built once from a [`WatchpostConfig`], then driven by
/// [`Orchestrator::run`] until a shutdown signal arrives.
#[derive(Debug)]
pub struct Orchestrator {
    /// Validated configuration the daemon was assembled from.
    config: WatchpostConfig,
    /// Registered modules in start order.
    plugins: PluginRegistry,
    /// Broadcast end that background tasks subscribe to for shutdown.
    shutdown_tx: broadcast::Sender<()>,
    /// Process start instant, the basis for uptime reporting.
    start_time: Instant,
    /// Alert sender kept alive for the daemon lifetime so the gateway's
    /// receive loop sees an open channel even when the pipeline is
    /// disabled.
    _alert_tx: mpsc::Sender<AlertEvent>,
}

impl Orchestrator {
    /// Load `watchpost.toml` from `config_path` and assemble the daemon.
    ///
    /// Environment variable overrides are applied during loading, and the
    /// resulting configuration is validated before any module is built.
    ///
    /// # Errors
    ///
    /// Fails when:
    /// - the file cannot be read or parsed
    /// - validation rejects the configuration
    /// - an enabled module fails to build
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = WatchpostConfig::load(config_path)
            .await
            .with_context(|| format!("failed to load config from {}", config_path.display()))?;
        Self::build_from_config(config).await
    }

    /// Assemble the daemon from an already-loaded configuration.
    ///
    /// Channel wiring happens here. The pipeline gets the alert sender
    /// and the submission receiver, the gateway gets the opposite ends.
    /// A disabled side is replaced by a drain task so the enabled side
    /// never observes a closed channel.
    pub async fn build_from_config(config: WatchpostConfig) -> Result<Self> {
        config.validate().context("config validation failed")?;

        // The recorder must exist before any module records a metric.
        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
            tracing::info!(port = config.metrics.port, "metrics exporter installed");
        }

        let (alert_tx, alert_rx) = mpsc::channel::<AlertEvent>(ALERT_CHANNEL_CAPACITY);
        let (submission_tx, submission_rx) =
            mpsc::channel::<RawEvent>(SUBMISSION_CHANNEL_CAPACITY);
        let (shutdown_tx, _) = broadcast::channel(16);
        tracing::debug!(
            alert_capacity = ALERT_CHANNEL_CAPACITY,
            submission_capacity = SUBMISSION_CHANNEL_CAPACITY,
            "module channels wired"
        );

        let mut plugins = PluginRegistry::new();

        if config.eve.enabled {
            tracing::info!("assembling eve pipeline");
            let eve_config = watchpost_eve_pipeline::EvePipelineConfig::from_core(&config.eve);
            let (pipeline, _) = watchpost_eve_pipeline::EvePipelineBuilder::new()
                .config(eve_config)
                .alert_sender(alert_tx.clone())
                .submission_receiver(submission_rx)
                .build()
                .context("failed to build eve pipeline")?;
            plugins.register(Box::new(pipeline))?;
        } else {
            tracing::debug!("eve pipeline disabled, draining submissions instead");
            tokio::spawn(drain_submissions(submission_rx, shutdown_tx.subscribe()));
        }

        if config.stream.enabled {
            tracing::info!("assembling stream gateway");
            let stream_config =
                watchpost_stream_gateway::StreamGatewayConfig::from_core(&config.stream);
            let gateway = watchpost_stream_gateway::StreamGatewayBuilder::new()
                .config(stream_config)
                .alert_receiver(alert_rx)
                .submission_sender(submission_tx.clone())
                .build()
                .context("failed to build stream gateway")?;
            plugins.register(Box::new(gateway))?;
        } else {
            tracing::debug!("stream gateway disabled, draining alerts instead");
            tokio::spawn(drain_alerts(alert_rx, shutdown_tx.subscribe()));
        }

        tracing::info!(plugins = plugins.count(), "orchestrator assembled");

        if config.metrics.enabled {
            record_daemon_metrics(plugins.count());
        }

        Ok(Self {
            config,
            plugins,
            shutdown_tx,
            start_time: Instant::now(),
            _alert_tx: alert_tx,
        })
    }

    /// Start every registered plugin and block until a shutdown signal.
    ///
    /// `SIGTERM` and `SIGINT` both trigger shutdown. Plugins start in
    /// registration order (producers first) and stop in the same order,
    /// which lets the gateway flush alerts that are already in flight.
    pub async fn run(&mut self) -> Result<()> {
        if let Some(path) = self.pid_path() {
            write_pid_file(path)?;
        }

        tracing::info!("initializing plugins");
        if let Err(e) = self.plugins.init_all().await {
            tracing::error!(error = %e, "plugin init failed");
            if let Some(path) = self.pid_path() {
                remove_pid_file(path);
            }
            return Err(e.into());
        }

        tracing::info!("starting plugins");
        if let Err(e) = self.plugins.start_all().await {
            tracing::warn!("start failed, stopping plugins that already started");
            if let Err(stop_err) = self.plugins.stop_all().await {
                tracing::error!(
                    start_error = %e,
                    stop_error = %stop_err,
                    "rollback stop failed as well"
                );
            }
            if let Some(path) = self.pid_path() {
                remove_pid_file(path);
            }
            return Err(e.into());
        }

        let uptime_task = self
            .config
            .metrics
            .enabled
            .then(|| spawn_uptime_updater(self.start_time, self.shutdown_tx.subscribe()));

        tracing::info!("daemon running, waiting for shutdown signal");
        let signal = wait_for_shutdown_signal().await?;
        tracing::info!(signal, "shutdown requested");

        // Wake the drain and uptime tasks before stopping the plugins.
        let _ = self.shutdown_tx.send(());
        if let Some(task) = uptime_task {
            let _ = task.await;
        }

        self.shutdown().await?;

        if let Some(path) = self.pid_path() {
            remove_pid_file(path);
        }
        Ok(())
    }

    /// Stop all plugins in registration order.
    async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("stopping plugins");
        self.plugins.stop_all().await?;
        Ok(())
    }

    /// Aggregate per-plugin health reports into a daemon-wide view.
    pub async fn health(&self) -> DaemonHealth {
        let reports = self.plugins.health_check_all().await;
        let modules: Vec<ModuleHealth> = reports
            .into_iter()
            .map(|report| ModuleHealth {
                name: report.name,
                // Disabled modules never enter the registry, so every
                // report here belongs to an enabled module.
                enabled: true,
                status: report.health,
            })
            .collect();

        let status = aggregate_status(&modules);
        let uptime_secs = self.start_time.elapsed().as_secs();

        if self.config.metrics.enabled {
            use watchpost_core::metrics as m;
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
        }

        DaemonHealth {
            status,
            uptime_secs,
            modules,
        }
    }

    /// The configuration the daemon was assembled from.
    pub fn config(&self) -> &WatchpostConfig {
        &self.config
    }

    /// The configured pid file path, or `None` when the field is empty.
    fn pid_path(&self) -> Option<&Path> {
        let raw = self.config.general.pid_file.as_str();
        if raw.is_empty() {
            None
        } else {
            Some(Path::new(raw))
        }
    }
}

/// Block until `SIGTERM` or `SIGINT` arrives and return the signal name.
///
/// # Errors
///
/// Fails when the signal handlers cannot be installed.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Create the pid file for this process.
///
/// The open uses `create_new`, so the creation itself is the
/// duplicate-instance check. The parent directory is created with mode
/// `0o700` and the file is restricted to `0o600`.
///
/// # Errors
///
/// Fails when the file already exists or cannot be created.
fn write_pid_file(path: &Path) -> Result<()> {
    use std::fs::{self, OpenOptions};
    use std::io::{ErrorKind, Write};

    if let Some(parent) = path.parent() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            fs::DirBuilder::new()
                .recursive(true)
                .mode(0o700)
                .create(parent)?;
        }
        #[cfg(not(unix))]
        fs::create_dir_all(parent)?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let holder = fs::read_to_string(path)
                .map(|s| s.trim().to_owned())
                .unwrap_or_else(|_| "unknown".to_owned());
            anyhow::bail!(
                "pid file {} already exists (pid {}), is another daemon running?",
                path.display(),
                holder
            );
        }
        Err(e) => return Err(e.into()),
    };

    // Do not write through a symlink or device node left at this path.
    if !file.metadata()?.is_file() {
        let _ = fs::remove_file(path);
        anyhow::bail!("pid file {} is not a regular file", path.display());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    let pid = std::process::id();
    writeln!(file, "{}", pid)?;
    tracing::info!(pid, path = %path.display(), "pid file created");
    Ok(())
}

/// Delete the pid file, logging instead of failing when it cannot be
/// removed.
fn remove_pid_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "pid file removed"),
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "could not remove pid file"
        ),
    }
}

/// Consume alert events while the stream gateway is disabled.
///
/// Keeps the pipeline's sends from failing against a dropped receiver.
/// Each drained alert is logged at debug level and discarded.
async fn drain_alerts(
    mut alert_rx: mpsc::Receiver<AlertEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            received = alert_rx.recv() => {
                let Some(event) = received else {
                    tracing::debug!("alert channel closed");
                    break;
                };
                tracing::debug!(
                    alert_id = %event.id,
                    alert = %event.alert,
                    "dropping alert, stream gateway disabled"
                );
            }
            _ = shutdown_rx.recv() => {
                tracing::debug!("alert drain stopping");
                break;
            }
        }
    }
}

/// Consume submitted raw events while the eve pipeline is disabled.
///
/// Keeps the gateway's sends from failing against a dropped receiver.
async fn drain_submissions(
    mut submission_rx: mpsc::Receiver<RawEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            received = submission_rx.recv() => {
                let Some(event) = received else {
                    tracing::debug!("submission channel closed");
                    break;
                };
                tracing::debug!(
                    trace_id = %event.metadata.trace_id,
                    event_type = event.event_type().unwrap_or("unknown"),
                    "dropping submission, eve pipeline disabled"
                );
            }
            _ = shutdown_rx.recv() => {
                tracing::debug!("submission drain stopping");
                break;
            }
        }
    }
}

/// Record one-time daemon gauges (build info and registered plugin count).
fn record_daemon_metrics(plugin_count: usize) {
    use watchpost_core::metrics as m;

    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    #[allow(clippy::cast_precision_loss)]
    metrics::gauge!(m::DAEMON_PLUGINS_REGISTERED).set(plugin_count as f64);

    tracing::debug!(plugins = plugin_count, "daemon gauges recorded");
}

/// Refresh the uptime gauge every 10 seconds until shutdown.
fn spawn_uptime_updater(
    start_time: Instant,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    use tokio::time::{Duration, MissedTickBehavior, interval};
    use watchpost_core::metrics as m;

    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(10));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    #[allow(clippy::cast_precision_loss)]
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS)
                        .set(start_time.elapsed().as_secs() as f64);
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("uptime updater stopping");
                    break;
                }
            }
        }
    })
}

//! Prometheus exporter setup.
//!
//! The daemon does not carry its own HTTP server for metrics. The
//! exporter from `metrics-exporter-prometheus` binds its built-in
//! listener instead, and everything recorded through the `metrics`
//! macros becomes scrapeable at `/metrics`.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use watchpost_core::config::MetricsConfig;
use watchpost_core::metrics as m;

/// Install the process-wide metrics recorder and bind its listener.
///
/// Call at most once per process. Every later `metrics::counter!`,
/// `gauge!`, or `histogram!` call lands in the installed recorder.
///
/// # Errors
///
/// Fails when:
/// - `endpoint` is anything other than `/metrics`
/// - the listen address does not parse
/// - a recorder has already been installed
pub fn install_metrics_recorder(config: &MetricsConfig) -> Result<()> {
    if config.endpoint != "/metrics" {
        anyhow::bail!(
            "unsupported metrics endpoint '{}': only '/metrics' is currently supported",
            config.endpoint
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.listen_addr, config.port)
        .parse()
        .context("invalid metrics listen address")?;

    if addr.ip().is_unspecified() {
        tracing::warn!(
            listen_addr = %addr,
            "metrics listener bound on all interfaces, restrict listen_addr on untrusted networks"
        );
    }

    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(m::EVE_PIPELINE_PROCESSING_DURATION_SECONDS.to_owned()),
            &m::PROCESSING_DURATION_BUCKETS,
        )
        .context("failed to configure histogram buckets")?
        .with_http_listener(addr)
        .install()
        .context("failed to install metrics recorder")?;

    m::describe_all();

    tracing::info!(listen_addr = %addr, "prometheus scrape endpoint active");
    Ok(())
}

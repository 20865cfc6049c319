//! Orchestrator assembly and health reporting.
//!
//! Exercises the build path from TOML text to a wired daemon, without
//! ever calling `run()` (these tests must not install signal handlers
//! or bind sockets on fixed ports).

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::sleep;
use watchpost_core::config::WatchpostConfig;
use watchpost_daemon::orchestrator::Orchestrator;

fn parse_config(toml_str: &str) -> WatchpostConfig {
    WatchpostConfig::parse(toml_str).expect("test config should parse")
}

fn disabled_config() -> WatchpostConfig {
    parse_config(
        r#"
[general]
log_level = "info"
pid_file = ""

[eve]
enabled = false

[stream]
enabled = false
"#,
    )
}

fn pipeline_only_config() -> WatchpostConfig {
    parse_config(
        r#"
[general]
log_level = "info"
pid_file = ""

[eve]
enabled = true
log_path = "/tmp/eve.json"
poll_interval_ms = 50

[stream]
enabled = false
"#,
    )
}

fn gateway_only_config() -> WatchpostConfig {
    parse_config(
        r#"
[general]
log_level = "info"
pid_file = ""

[eve]
enabled = false

[stream]
enabled = true
bind = "127.0.0.1:0"
flush_interval_ms = 100
"#,
    )
}

#[tokio::test]
async fn test_build_with_all_modules_disabled() {
    // Given: A config where both modules are switched off
    let config = disabled_config();

    // When: Assembling the daemon
    let orchestrator = Orchestrator::build_from_config(config)
        .await
        .expect("build should succeed with nothing enabled");

    // Then: The registry stays empty
    let health = orchestrator.health().await;
    assert!(
        health.modules.is_empty(),
        "no module should register, got: {:?}",
        health.modules
    );
}

#[tokio::test]
async fn test_build_with_pipeline_only() {
    // Given: A config enabling just the eve pipeline
    let config = pipeline_only_config();

    // When: Assembling the daemon
    let orchestrator = Orchestrator::build_from_config(config)
        .await
        .expect("build should succeed");

    // Then: Exactly the pipeline registers, marked enabled
    let health = orchestrator.health().await;
    assert_eq!(health.modules.len(), 1);
    assert_eq!(health.modules[0].name, "eve-pipeline");
    assert!(health.modules[0].enabled);
}

#[tokio::test]
async fn test_build_with_gateway_only() {
    // Given: A config enabling just the stream gateway
    let config = gateway_only_config();

    // When: Assembling the daemon
    let orchestrator = Orchestrator::build_from_config(config)
        .await
        .expect("build should succeed");

    // Then: Exactly the gateway registers
    let health = orchestrator.health().await;
    assert_eq!(health.modules.len(), 1);
    assert_eq!(health.modules[0].name, "stream-gateway");
}

#[tokio::test]
async fn test_build_registers_producer_before_consumer() {
    // Given: A config with both modules enabled
    let config = parse_config(
        r#"
[general]
log_level = "info"
pid_file = ""

[eve]
enabled = true
log_path = "/tmp/eve.json"
poll_interval_ms = 50

[stream]
enabled = true
bind = "127.0.0.1:0"
flush_interval_ms = 100
"#,
    );

    // When: Assembling the daemon
    let orchestrator = Orchestrator::build_from_config(config)
        .await
        .expect("build should succeed");

    // Then: The pipeline sits ahead of the gateway in start order
    let health = orchestrator.health().await;
    let names: Vec<&str> = health.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["eve-pipeline", "stream-gateway"]);
}

#[tokio::test]
async fn test_build_rejects_invalid_bind_address() {
    // Given: A gateway bind address that cannot parse
    let config = parse_config(
        r#"
[stream]
enabled = true
bind = "not-an-address"
"#,
    );

    // When: Assembling the daemon
    let err = Orchestrator::build_from_config(config)
        .await
        .expect_err("validation should reject the bind address");

    // Then: The error points at validation
    let msg = err.to_string();
    assert!(msg.contains("config validation failed"), "got: {msg}");
}

#[tokio::test]
async fn test_health_with_nothing_enabled_is_healthy() {
    // Given: A daemon with an empty registry
    let config = disabled_config();
    let orchestrator = Orchestrator::build_from_config(config)
        .await
        .expect("build should succeed");

    // When: Asking for health
    let health = orchestrator.health().await;

    // Then: Nothing can be failing
    assert!(health.status.is_healthy(), "got: {}", health.status);
    assert!(health.modules.is_empty());
}

#[tokio::test]
async fn test_health_before_start_reports_unhealthy() {
    // Given: A built daemon whose modules were never started
    let config = pipeline_only_config();
    let orchestrator = Orchestrator::build_from_config(config)
        .await
        .expect("build should succeed");

    // When: Asking for health before run()
    let health = orchestrator.health().await;

    // Then: The idle pipeline counts as unhealthy
    assert!(health.status.is_unhealthy(), "got: {}", health.status);
}

#[tokio::test]
async fn test_config_is_readable_after_build() {
    // Given: A config with a known log level
    let config = disabled_config();
    let log_level = config.general.log_level.clone();

    // When: Assembling the daemon
    let orchestrator = Orchestrator::build_from_config(config)
        .await
        .expect("build should succeed");

    // Then: The accessor hands back the same values
    assert_eq!(orchestrator.config().general.log_level, log_level);
}

#[tokio::test]
async fn test_uptime_never_decreases() {
    // Given: A freshly built daemon
    let config = disabled_config();
    let orchestrator = Orchestrator::build_from_config(config)
        .await
        .expect("build should succeed");

    // When: Sampling uptime twice with a pause in between
    let first = orchestrator.health().await.uptime_secs;
    sleep(Duration::from_millis(100)).await;
    let second = orchestrator.health().await.uptime_secs;

    // Then: The second sample is at least the first
    assert!(
        second >= first,
        "uptime went backwards: {first} -> {second}"
    );
}

#[tokio::test]
async fn test_build_from_missing_file_fails() {
    // Given: A path nothing lives at
    let path = PathBuf::from("/nonexistent/path/to/config.toml");

    // When: Loading and assembling from that path
    let err = Orchestrator::build(&path)
        .await
        .expect_err("loading a missing file should fail");

    // Then: The error names the config load step
    let msg = err.to_string();
    assert!(
        msg.contains("failed to load config") || msg.contains("not found"),
        "got: {msg}"
    );
}

#[tokio::test]
async fn test_build_reads_config_from_disk() {
    // Given: A config file written to a temp path
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"
[general]
log_level = "debug"
pid_file = ""

[eve]
enabled = false

[stream]
enabled = false
"#
    )
    .expect("write config");
    file.flush().expect("flush config");

    // When: Assembling from the file path
    let orchestrator = Orchestrator::build(file.path())
        .await
        .expect("build from file should succeed");

    // Then: Values come from the file, not the defaults
    assert_eq!(orchestrator.config().general.log_level, "debug");
}

#[tokio::test]
async fn test_build_accepts_partial_config() {
    // Given: A config that leaves whole sections out
    let config = parse_config(
        r#"
[general]
log_level = "debug"

[eve]
enabled = false

[stream]
enabled = false
"#,
    );

    // When/Then: Missing sections fall back to defaults and build works
    Orchestrator::build_from_config(config)
        .await
        .expect("partial config should build");
}

#[tokio::test]
async fn test_empty_config_builds_with_defaults() {
    // Given: An entirely empty config document
    let config = parse_config("");

    // When: Assembling the daemon
    let orchestrator = Orchestrator::build_from_config(config)
        .await
        .expect("empty config should build");

    // Then: Defaults enable both modules and keep metrics off
    let config = orchestrator.config();
    assert!(config.eve.enabled);
    assert!(config.stream.enabled);
    assert!(!config.metrics.enabled);

    let health = orchestrator.health().await;
    assert_eq!(health.modules.len(), 2);
}

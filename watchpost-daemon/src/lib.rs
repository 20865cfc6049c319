//! Library surface of the daemon crate.
//!
//! The binary lives in `main.rs`; these modules are public so the
//! integration tests can drive the orchestrator directly.

pub mod cli;
pub mod health;
pub mod logging;
pub mod metrics_server;
pub mod orchestrator;

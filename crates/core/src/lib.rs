#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod plugin;
pub mod types;

// 자주 쓰는 타입은 크레이트 루트에서 바로 가져올 수 있게 올려 둡니다.

pub use config::WatchpostConfig;
pub use error::{ConfigError, PipelineError, PluginError, WatchpostError};
pub use event::{AlertEvent, EventMetadata, RawEvent};
pub use plugin::{
    BoxFuture, DynPlugin, HealthStatus, Plugin, PluginHealth, PluginInfo, PluginRegistry,
    PluginState, PluginType,
};
pub use types::Alert;

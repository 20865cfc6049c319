#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//! - [`config`]: 게이트웨이 설정 및 빌더
//! - [`error`]: 게이트웨이 에러 타입
//! - [`buffer`]: 알림 배치 버퍼
//! - [`session`]: WebSocket 세션 레지스트리
//! - [`pipeline`]: 게이트웨이 오케스트레이션

pub mod buffer;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;

mod server;

pub use buffer::AlertBatch;
pub use config::{StreamGatewayConfig, StreamGatewayConfigBuilder};
pub use error::StreamGatewayError;
pub use pipeline::{StreamGateway, StreamGatewayBuilder};
pub use session::SessionRegistry;

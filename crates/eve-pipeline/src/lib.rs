#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//! - [`config`]: 파이프라인 설정 및 빌더
//! - [`error`]: eve 파이프라인 에러 타입
//! - [`tail`]: eve.json tail 수집기
//! - [`normalize`]: Suricata 이벤트 -> Alert 정규화
//! - [`import`]: NDJSON/JSON 배열 일괄 가져오기
//! - [`pipeline`]: 전체 파이프라인 오케스트레이션

pub mod config;
pub mod error;
pub mod import;
pub mod normalize;
pub mod pipeline;
pub mod tail;

pub use config::{EvePipelineConfig, EvePipelineConfigBuilder};
pub use error::EvePipelineError;
pub use import::import_events;
pub use normalize::{normalize, should_emit};
pub use pipeline::{EvePipeline, EvePipelineBuilder};
pub use tail::{EveTailCollector, EveTailConfig};

//! 게이트웨이 구동 설정
//!
//! 공통 설정([`StreamConfig`](watchpost_core::config::StreamConfig))은 수신
//! 주소와 플러시 주기까지만 다루고, 임포트 본문 상한 같은 내부 조절값은
//! [`StreamGatewayConfig`]가 들고 있습니다. 두 층은
//! [`StreamGatewayConfig::from_core`]로 이어집니다.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::StreamGatewayError;

/// 서버와 플러시 태스크가 참조하는 설정 묶음
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamGatewayConfig {
    /// 게이트웨이 기동 여부
    pub enabled: bool,
    /// WebSocket/HTTP 수신 주소
    pub bind: String,
    /// 알림 배치 플러시 주기 (밀리초)
    pub flush_interval_ms: u64,

    // 여기부터는 공통 설정에 없는 내부 조절값
    /// 임포트 요청 본문 상한 (바이트)
    pub max_import_bytes: usize,
}

impl Default for StreamGatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0:8088".to_owned(),
            flush_interval_ms: 1000,
            max_import_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl StreamGatewayConfig {
    /// 공통 설정의 stream 섹션을 게이트웨이 설정으로 끌어올립니다.
    /// 섹션에 없는 내부 조절값은 기본값으로 채워집니다.
    pub fn from_core(core: &watchpost_core::config::StreamConfig) -> Self {
        Self {
            enabled: core.enabled,
            bind: core.bind.clone(),
            flush_interval_ms: core.flush_interval_ms,
            ..Self::default()
        }
    }

    /// 값 범위를 점검합니다. 빌더의 `build()`와 기동 경로 양쪽에서 부릅니다.
    pub fn validate(&self) -> Result<(), StreamGatewayError> {
        fn reject(field: &str, reason: impl Into<String>) -> StreamGatewayError {
            StreamGatewayError::Config {
                field: field.to_owned(),
                reason: reason.into(),
            }
        }

        const MAX_FLUSH_INTERVAL_MS: u64 = 60_000;
        const MAX_IMPORT_BYTES: usize = 256 * 1024 * 1024;

        if self.bind.parse::<SocketAddr>().is_err() {
            return Err(reject(
                "bind",
                format!("invalid socket address: {}", self.bind),
            ));
        }
        if !(1..=MAX_FLUSH_INTERVAL_MS).contains(&self.flush_interval_ms) {
            return Err(reject(
                "flush_interval_ms",
                format!("must be 1-{MAX_FLUSH_INTERVAL_MS}"),
            ));
        }
        if !(1..=MAX_IMPORT_BYTES).contains(&self.max_import_bytes) {
            return Err(reject(
                "max_import_bytes",
                format!("must be 1-{MAX_IMPORT_BYTES}"),
            ));
        }
        Ok(())
    }
}

/// 체이닝으로 값을 채우고 `build()`에서 검증까지 마치는 빌더
#[derive(Default)]
pub struct StreamGatewayConfigBuilder {
    config: StreamGatewayConfig,
}

impl StreamGatewayConfigBuilder {
    /// 기본값에서 시작합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 게이트웨이 기동 여부
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// 수신 주소
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.config.bind = addr.into();
        self
    }

    /// 플러시 주기 (밀리초)
    pub fn flush_interval_ms(mut self, ms: u64) -> Self {
        self.config.flush_interval_ms = ms;
        self
    }

    /// 임포트 본문 상한 (바이트)
    pub fn max_import_bytes(mut self, bytes: usize) -> Self {
        self.config.max_import_bytes = bytes;
        self
    }

    /// 검증을 통과한 설정을 돌려줍니다.
    pub fn build(self) -> Result<StreamGatewayConfig, StreamGatewayError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

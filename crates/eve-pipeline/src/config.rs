//! 파이프라인 구동 설정
//!
//! 데몬이 읽는 공통 설정([`EveConfig`](watchpost_core::config::EveConfig))에는
//! 파일 경로와 폴링 주기만 있고, 라인 누적 한도나 채널 용량 같은 내부
//! 조절값은 이 크레이트의 [`EvePipelineConfig`]가 들고 있습니다.
//! 두 층은 [`EvePipelineConfig::from_core`]로 이어집니다.

use serde::{Deserialize, Serialize};

use crate::error::EvePipelineError;

/// tail 수집기와 정규화 태스크가 참조하는 설정 묶음
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvePipelineConfig {
    /// 파이프라인 기동 여부
    pub enabled: bool,
    /// 따라갈 Suricata eve.json 경로
    pub log_path: String,
    /// 새 라인 확인 주기 (밀리초)
    pub poll_interval_ms: u64,

    // 여기부터는 공통 설정에 없는 내부 조절값
    /// 미완성 라인을 담아 두는 누적 버퍼 상한 (바이트)
    pub max_line_length: usize,
    /// 수집기에서 처리 태스크로 가는 채널 용량
    pub raw_channel_capacity: usize,
}

impl Default for EvePipelineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_path: "/var/log/suricata/eve.json".to_owned(),
            poll_interval_ms: 200,
            max_line_length: 1024 * 1024, // 1MB
            raw_channel_capacity: 1024,
        }
    }
}

impl EvePipelineConfig {
    /// 공통 설정의 eve 섹션을 파이프라인 설정으로 끌어올립니다.
    /// 섹션에 없는 내부 조절값은 기본값으로 채워집니다.
    pub fn from_core(core: &watchpost_core::config::EveConfig) -> Self {
        Self {
            enabled: core.enabled,
            log_path: core.log_path.clone(),
            poll_interval_ms: core.poll_interval_ms,
            ..Self::default()
        }
    }

    /// 값 범위를 점검합니다. 빌더의 `build()`와 기동 경로 양쪽에서 부릅니다.
    pub fn validate(&self) -> Result<(), EvePipelineError> {
        fn reject(field: &str, reason: impl Into<String>) -> EvePipelineError {
            EvePipelineError::Config {
                field: field.to_owned(),
                reason: reason.into(),
            }
        }

        const MAX_POLL_INTERVAL_MS: u64 = 60_000;
        const MAX_LINE_LENGTH: usize = 64 * 1024 * 1024;

        if self.log_path.is_empty() {
            return Err(reject("log_path", "must not be empty"));
        }
        if !(1..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(reject(
                "poll_interval_ms",
                format!("must be 1-{MAX_POLL_INTERVAL_MS}"),
            ));
        }
        if !(1..=MAX_LINE_LENGTH).contains(&self.max_line_length) {
            return Err(reject(
                "max_line_length",
                format!("must be 1-{MAX_LINE_LENGTH}"),
            ));
        }
        if self.raw_channel_capacity == 0 {
            return Err(reject("raw_channel_capacity", "must be greater than 0"));
        }
        Ok(())
    }
}

/// 체이닝으로 값을 채우고 `build()`에서 검증까지 마치는 빌더
#[derive(Default)]
pub struct EvePipelineConfigBuilder {
    config: EvePipelineConfig,
}

impl EvePipelineConfigBuilder {
    /// 기본값에서 시작합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 파이프라인 기동 여부
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// eve.json 경로
    pub fn log_path(mut self, path: impl Into<String>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// 폴링 주기 (밀리초)
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// 누적 버퍼 상한 (바이트)
    pub fn max_line_length(mut self, bytes: usize) -> Self {
        self.config.max_line_length = bytes;
        self
    }

    /// 수집 채널 용량
    pub fn raw_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.raw_channel_capacity = capacity;
        self
    }

    /// 검증을 통과한 설정을 돌려줍니다.
    pub fn build(self) -> Result<EvePipelineConfig, EvePipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

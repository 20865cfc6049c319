//! 파이프라인 내부 에러와 코어 에러로의 변환
//!
//! 수집기, 임포터, 설정, 채널 계층이 공유하는 [`EvePipelineError`]를
//! 정의합니다. `WatchpostError`로의 `From` 변환이 있으므로 데몬 쪽
//! 코드는 `?` 하나로 전파를 끝낼 수 있습니다.

use watchpost_core::error::{PipelineError, WatchpostError};

/// eve 파이프라인에서 생길 수 있는 에러
#[derive(Debug, thiserror::Error)]
pub enum EvePipelineError {
    /// 임포트 본문 파싱 실패 (배열 모드의 외곽 에러)
    #[error("parse error: line {line}: {reason}")]
    Parse {
        /// 1부터 세는 줄 번호
        line: usize,
        /// serde_json이 보고한 사유
        reason: String,
    },

    /// tail 수집기의 열기/읽기 실패
    #[error("collector error: {source_type}: {reason}")]
    Collector {
        /// 어느 수집기인지 (eve_tail)
        source_type: String,
        /// 실패 내용
        reason: String,
    },

    /// 파이프라인 설정 값 거부
    #[error("config error: {field}: {reason}")]
    Config {
        /// 거부된 필드
        field: String,
        /// 거부 사유
        reason: String,
    },

    /// 상대편이 닫힌 채널 사용
    #[error("channel error: {0}")]
    Channel(String),

    /// 그 외 I/O 실패
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EvePipelineError> for WatchpostError {
    fn from(err: EvePipelineError) -> Self {
        WatchpostError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}

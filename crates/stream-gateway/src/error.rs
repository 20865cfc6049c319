//! 게이트웨이 내부 에러와 코어 에러로의 변환
//!
//! 서버, 세션 레지스트리, 플러시 태스크가 공유하는
//! [`StreamGatewayError`]를 정의합니다. `WatchpostError`로의 `From`
//! 변환이 있으므로 데몬 쪽 코드는 `?` 하나로 전파를 끝낼 수 있습니다.

use watchpost_core::error::{PipelineError, WatchpostError};

/// 스트림 게이트웨이에서 생길 수 있는 에러
#[derive(Debug, thiserror::Error)]
pub enum StreamGatewayError {
    /// 수신 주소를 점유하지 못함
    #[error("bind error: {addr}: {reason}")]
    Bind {
        /// 점유를 시도한 주소
        addr: String,
        /// 실패 내용
        reason: String,
    },

    /// 게이트웨이 설정 값 거부
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

    /// 배치 페이로드 직렬화 실패
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// 그 외 I/O 실패
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StreamGatewayError> for WatchpostError {
    fn from(err: StreamGatewayError) -> Self {
        WatchpostError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}

//! 도메인별 에러 enum과 최상위 변환
//!
//! 각 하위 에러는 `#[from]`으로 [`WatchpostError`]에 흡수되므로
//! 크레이트 경계를 넘는 함수는 `WatchpostError` 하나만 돌려주면 됩니다.

/// 크레이트 전체를 덮는 최상위 에러
#[derive(Debug, thiserror::Error)]
pub enum WatchpostError {
    /// 설정 로드 또는 검증 실패
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 이벤트 파이프라인 쪽 실패
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 플러그인 수명주기 위반
    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),

    /// 파일/소켓 I/O 실패
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 파일과 그 내용에 대한 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 지정한 경로에 파일이 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// TOML 해석 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 검증을 통과하지 못한 필드
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 이벤트 흐름 처리 중의 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 수신자가 사라진 채널로의 전송
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 송신자가 사라진 채널에서의 수신
    #[error("channel receive failed: {0}")]
    ChannelRecv(String),

    /// 기동 준비 단계 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 실행 중 상태에서 다시 start를 호출함
    #[error("pipeline already running")]
    AlreadyRunning,

    /// 실행 중이 아닌데 stop을 호출함
    #[error("pipeline not running")]
    NotRunning,
}

/// 플러그인 등록/상태 전이 에러
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// 같은 이름이 레지스트리에 이미 있음
    #[error("plugin already registered: {name}")]
    AlreadyRegistered { name: String },

    /// 레지스트리에 없는 이름
    #[error("plugin not found: {name}")]
    NotFound { name: String },

    /// 현재 상태에서 허용되지 않는 전이
    #[error("plugin '{name}' in invalid state: {current} (expected: {expected})")]
    InvalidState {
        name: String,
        current: String,
        expected: String,
    },

    /// stop 단계에서 하나 이상 실패
    #[error("plugin stop failed: {0}")]
    StopFailed(String),
}

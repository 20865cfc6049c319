//! 모듈 사이를 오가는 이벤트 타입 정의
//!
//! 수집 단계와 정규화 단계는 채널로 이벤트를 주고받습니다.
//! 공통 추적 정보는 [`EventMetadata`]에 담기고, 파싱 직후의 레코드는
//! [`RawEvent`]로, 대시보드 스키마에 맞춘 결과는 [`AlertEvent`]로
//! 표현됩니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Alert;

// --- 모듈 이름 상수 ---

/// eve 파이프라인 모듈명
pub const MODULE_EVE_PIPELINE: &str = "eve-pipeline";
/// 스트림 게이트웨이 모듈명
pub const MODULE_STREAM_GATEWAY: &str = "stream-gateway";

/// 모든 이벤트에 공통으로 붙는 추적 정보
///
/// 발생 시각과 생성 모듈명, 같은 흐름의 이벤트를 묶어 주는 trace_id를
/// 담습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트를 만든 모듈명 ("eve-pipeline" 등)
    pub source_module: String,
    /// 같은 흐름의 이벤트를 묶는 추적 ID
    pub trace_id: String,
}

impl EventMetadata {
    /// 전달받은 trace_id를 그대로 써서 메타데이터를 만듭니다.
    ///
    /// 원시 이벤트에서 이어지는 체인이 추적 ID를 공유할 때 씁니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// UUID v4 trace_id를 새로 발급해 메타데이터를 만듭니다.
    ///
    /// 체인의 첫 이벤트를 만들 때 씁니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] source={} trace={}",
            epoch_secs(self.timestamp),
            self.source_module,
            self.trace_id,
        )
    }
}

/// 파싱은 끝났지만 아직 정규화되지 않은 eve 레코드
///
/// 파일 tail 경로와 게이트웨이 제출 경로가 같은 타입으로 정규화
/// 단계에 레코드를 넘깁니다.
#[derive(Debug, Clone)]
pub struct RawEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 파싱된 원본 레코드
    pub data: Value,
}

impl RawEvent {
    /// 새 trace를 시작하는 원시 이벤트를 만듭니다.
    pub fn new(data: Value, source_module: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(source_module),
            data,
        }
    }

    /// 레코드 최상위의 event_type 문자열을 돌려줍니다.
    pub fn event_type(&self) -> Option<&str> {
        self.data.get("event_type").and_then(Value::as_str)
    }
}

impl fmt::Display for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RawEvent[{}] source={} type={}",
            short_id(&self.id),
            self.metadata.source_module,
            self.event_type().unwrap_or("-"),
        )
    }
}

/// 대시보드 스키마로 정규화된 알림 이벤트
///
/// trace_id는 원본 [`RawEvent`]에서 이어받거나 새로 발급합니다.
#[derive(Debug, Clone)]
pub struct AlertEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 정규화된 알림
    pub alert: Alert,
}

impl AlertEvent {
    /// 새 trace를 시작하는 알림 이벤트를 만듭니다.
    pub fn new(alert: Alert) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_EVE_PIPELINE),
            alert,
        }
    }

    /// 기존 trace에 이어지는 알림 이벤트를 만듭니다.
    pub fn with_trace(alert: Alert, trace_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(MODULE_EVE_PIPELINE, trace_id),
            alert,
        }
    }
}

impl fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AlertEvent[{}] {}", short_id(&self.id), self.alert)
    }
}

/// 로그 한 줄에 넣기 좋게 UUID 앞 8자만 자릅니다.
fn short_id(id: &str) -> &str {
    &id[..8.min(id.len())]
}

/// 타임스탬프를 epoch 초 문자열로 바꿉니다. 역전된 시계는 "unknown"이 됩니다.
fn epoch_secs(time: SystemTime) -> String {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "unknown".to_owned())
}

//! 캡처 파일 일괄 임포트
//!
//! NDJSON(줄 단위 JSON) 또는 단일 JSON 배열 형식의 eve 캡처 내용을
//! 정규화된 알림 목록으로 변환합니다. 실시간 tail 경로와 동일한
//! [`should_emit`]/[`normalize`] 판단을 공유합니다.

use serde_json::Value;
use tracing::warn;

use watchpost_core::types::Alert;

use crate::error::EvePipelineError;
use crate::normalize::{normalize, should_emit};

/// 캡처 내용을 파싱해 알림 목록을 생성합니다.
///
/// 첫 번째 비공백 문자가 `[`이면 전체를 하나의 JSON 배열로 파싱하고,
/// 그 외에는 NDJSON으로 취급합니다. 두 모드 모두 입력 순서를 보존합니다.
///
/// # Errors
/// 배열 모드에서 외곽 파싱이 실패하면 [`EvePipelineError::Parse`]를
/// 반환합니다. NDJSON 모드는 실패하지 않으며, 잘못된 줄은 줄 번호와
/// 함께 경고 로그를 남기고 건너뜁니다.
pub fn import_events(content: &str) -> Result<Vec<Alert>, EvePipelineError> {
    if content.trim_start().starts_with('[') {
        import_array(content)
    } else {
        Ok(import_ndjson(content))
    }
}

/// JSON 배열 모드: 외곽 파싱 실패는 치명적, 비객체 원소는 건너뜁니다.
fn import_array(content: &str) -> Result<Vec<Alert>, EvePipelineError> {
    let values: Vec<Value> =
        serde_json::from_str(content).map_err(|e| EvePipelineError::Parse {
            line: e.line(),
            reason: e.to_string(),
        })?;

    let mut alerts = Vec::new();
    for (index, value) in values.into_iter().enumerate() {
        if !value.is_object() {
            warn!(index, "skipping non-object array element");
            continue;
        }
        if should_emit(&value) {
            alerts.push(normalize(&value));
        }
    }
    Ok(alerts)
}

/// NDJSON 모드: 각 줄을 독립적으로 파싱하며, 잘못된 줄은 건너뜁니다.
fn import_ndjson(content: &str) -> Vec<Alert> {
    let mut alerts = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) if value.is_object() => {
                if should_emit(&value) {
                    alerts.push(normalize(&value));
                }
            }
            Ok(_) => {
                warn!(line = line_idx + 1, "skipping non-object json line");
            }
            Err(e) => {
                warn!(line = line_idx + 1, error = %e, "skipping malformed json line");
            }
        }
    }
    alerts
}

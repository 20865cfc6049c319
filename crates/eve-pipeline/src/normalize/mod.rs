//! 스키마 정규화 -- 느슨한 eve 이벤트를 평탄한 [`Alert`]로 변환합니다.
//!
//! Suricata, Snort 유래 포맷, 수동 제출 이벤트 등 서로 다른 모양의 JSON을
//! 하나의 대시보드 스키마로 통합합니다. 필드별 폴백 체인은 [`fields`]에
//! 데이터로 정의되어 있습니다.
//!
//! # 전체 함수
//! [`normalize`]는 임의의 JSON 값에 대해 항상 정확히 하나의 `Alert`를
//! 생성합니다. 패닉하거나 실패하지 않으며, 알 수 없는 모양의 입력은
//! 모든 선택 필드가 null이고 `original`만 채워진 알림이 됩니다.

mod fields;
mod timestamp;

use serde_json::Value;

use watchpost_core::types::Alert;

use fields::resolve;

static NULL_SECTION: Value = Value::Null;

/// 이벤트를 대시보드로 내보낼지 판단합니다.
///
/// `event_type`이 `"stats"` 또는 `"flow"`이면 제외합니다. 그 외의 값,
/// 누락, 문자열이 아닌 타입은 모두 내보냅니다. 실시간 tail 경로와
/// 일괄 임포트 경로가 이 판단을 공유합니다.
pub fn should_emit(raw: &Value) -> bool {
    !matches!(
        raw.get("event_type").and_then(Value::as_str),
        Some("stats" | "flow")
    )
}

/// 원시 eve 이벤트를 [`Alert`]로 정규화합니다.
///
/// `event_type`이 `"dns"`인 레코드는 경량 투영을 거치고, 그 외에는
/// 폴백 체인 기반의 일반 해석을 거칩니다. `original`은 입력을 그대로
/// 보존합니다.
pub fn normalize(raw: &Value) -> Alert {
    if raw.get("event_type").and_then(Value::as_str) == Some("dns") {
        return normalize_dns(raw);
    }

    let section = bind_section(raw);

    let mut src_ip = resolve(raw, section, fields::SRC_IP).and_then(string_value);
    let mut src_port = resolve(raw, section, fields::SRC_PORT).and_then(port_value);
    if src_ip.is_none() || src_port.is_none() {
        if let Some(ap) = raw.get("src_ap").and_then(Value::as_str) {
            let (ip, port) = split_endpoint(ap);
            src_ip = src_ip.or(ip);
            src_port = src_port.or(port);
        }
    }

    let mut dest_ip = resolve(raw, section, fields::DEST_IP).and_then(string_value);
    let mut dest_port = resolve(raw, section, fields::DEST_PORT).and_then(port_value);
    if dest_ip.is_none() || dest_port.is_none() {
        if let Some(ap) = raw.get("dst_ap").and_then(Value::as_str) {
            let (ip, port) = split_endpoint(ap);
            dest_ip = dest_ip.or(ip);
            dest_port = dest_port.or(port);
        }
    }

    Alert {
        timestamp: resolve(raw, section, fields::TIMESTAMP)
            .map(|value| timestamp::render(value, raw)),
        src_ip,
        dest_ip,
        src_port,
        dest_port,
        signature: resolve(raw, section, fields::SIGNATURE).and_then(string_value),
        signature_id: resolve(raw, section, fields::SIGNATURE_ID).and_then(signature_id_value),
        gid: resolve(raw, section, fields::GID).cloned(),
        severity: resolve(raw, section, fields::SEVERITY).and_then(number_value),
        protocol: resolve(raw, section, fields::PROTOCOL).and_then(string_value),
        action: resolve(raw, section, fields::ACTION).and_then(string_value),
        pkt_num: resolve(raw, section, fields::PKT_NUM).cloned(),
        original: raw.clone(),
    }
}

/// alert 섹션을 레코드당 한 번 바인딩합니다.
///
/// `raw.alert`, `raw.Event.alert`, `raw.Event` 순서로 첫 번째 non-null
/// 객체를 선택합니다. 없으면 null 섹션이며 섹션 조회는 항상 실패합니다.
fn bind_section(raw: &Value) -> &Value {
    [
        raw.get("alert"),
        raw.get("Event").and_then(|event| event.get("alert")),
        raw.get("Event"),
    ]
    .into_iter()
    .flatten()
    .find(|value| !value.is_null())
    .unwrap_or(&NULL_SECTION)
}

/// DNS 이벤트 경량 투영
///
/// 일반 폴백 체인을 재사용하지 않고 루트의 평탄한 주소/포트 키만 읽으며,
/// 시그니처는 질의 도메인으로 합성합니다.
fn normalize_dns(raw: &Value) -> Alert {
    let section = bind_section(raw);

    let signature = match raw
        .get("dns")
        .and_then(|dns| dns.get("rrname"))
        .and_then(Value::as_str)
    {
        Some(rrname) => format!("DNS query for {rrname}"),
        None => "DNS query for unknown domain".to_owned(),
    };

    Alert {
        timestamp: raw
            .get("timestamp")
            .map(|value| timestamp::render(value, raw))
            .filter(|value| !value.is_null()),
        src_ip: raw.get("src_ip").and_then(string_value),
        dest_ip: raw.get("dest_ip").and_then(string_value),
        src_port: raw.get("src_port").and_then(port_value),
        dest_port: raw.get("dest_port").and_then(port_value),
        signature: Some(signature),
        signature_id: None,
        gid: None,
        severity: section.get("severity").and_then(number_value),
        protocol: raw.get("proto").and_then(string_value),
        action: None,
        pkt_num: None,
        original: raw.clone(),
    }
}

/// 문자열 필드 추출: 문자열은 그대로, 숫자/불리언은 문자열화합니다.
fn string_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 포트 추출: 정수 또는 정수 문자열만 허용하며, 실패는 None입니다.
fn port_value(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.parse::<u16>().ok(),
        _ => None,
    }
}

/// 숫자 필드 추출: 숫자 값만 그대로 통과합니다. 재스케일하지 않습니다.
fn number_value(value: &Value) -> Option<serde_json::Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        _ => None,
    }
}

/// 숫자 signature_id는 `signature ID:` 접두사를 붙이고,
/// 문자열은 그대로 통과합니다.
fn signature_id_value(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(format!("signature ID:{n}")),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// `"ip:port"` 엔드포인트 문자열을 마지막 콜론에서 분리합니다.
///
/// IPv6 주소에 포함된 콜론 때문에 마지막 콜론을 기준으로 합니다.
/// 포트 파싱 실패는 null 포트이며 에러가 아닙니다.
fn split_endpoint(ap: &str) -> (Option<String>, Option<u16>) {
    match ap.rsplit_once(':') {
        Some((ip, port)) => {
            let ip = if ip.is_empty() {
                None
            } else {
                Some(ip.to_owned())
            };
            (ip, port.parse::<u16>().ok())
        }
        None => {
            if ap.is_empty() {
                (None, None)
            } else {
                (Some(ap.to_owned()), None)
            }
        }
    }
}

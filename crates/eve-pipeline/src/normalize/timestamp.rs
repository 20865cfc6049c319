//! 타임스탬프 렌더링
//!
//! 정수 epoch 초는 `raw.Event.event_microsecond`와 결합해 ISO-8601 UTC
//! 문자열로 변환합니다. 정수가 아닌 타임스탬프 값은 그대로 통과합니다.

use chrono::{DateTime, SecondsFormat};
use serde_json::Value;

/// 해석된 타임스탬프 후보를 출력 값으로 렌더링합니다.
///
/// 정수 epoch이면 ISO-8601 문자열, 그 외에는 입력 값 그대로입니다.
/// epoch이 chrono 표현 범위를 벗어나면 입력 값을 그대로 반환합니다.
pub(super) fn render(value: &Value, raw: &Value) -> Value {
    match value.as_i64() {
        Some(epoch) => match epoch_to_iso(epoch, event_microsecond(raw)) {
            Some(iso) => Value::String(iso),
            None => value.clone(),
        },
        None => value.clone(),
    }
}

/// `raw.Event.event_microsecond`를 읽습니다. 없거나 범위를 벗어나면 0입니다.
fn event_microsecond(raw: &Value) -> u32 {
    let candidate = raw.get("Event").and_then(|event| event.get("event_microsecond"));
    let micro = match candidate {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse::<u64>().ok(),
        _ => None,
    };
    micro
        .and_then(|m| u32::try_from(m).ok())
        .filter(|m| *m < 1_000_000)
        .unwrap_or(0)
}

/// epoch 초와 마이크로초를 ISO-8601 UTC 문자열로 변환합니다.
///
/// 마이크로초가 0이면 초 단위 정밀도로 렌더링합니다.
fn epoch_to_iso(epoch: i64, micro: u32) -> Option<String> {
    let dt = DateTime::from_timestamp(epoch, micro * 1_000)?;
    let formatted = if micro == 0 {
        dt.to_rfc3339_opts(SecondsFormat::Secs, false)
    } else {
        dt.to_rfc3339_opts(SecondsFormat::Micros, false)
    };
    Some(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_epoch_renders_seconds_precision() {
        let rendered = render(&json!(1_700_000_000), &json!({}));
        assert_eq!(rendered, json!("2023-11-14T22:13:20+00:00"));
    }

    #[test]
    fn epoch_with_microseconds_renders_micros_precision() {
        let raw = json!({"Event": {"event_microsecond": 500_000}});
        let rendered = render(&json!(1_700_000_000), &raw);
        assert_eq!(rendered, json!("2023-11-14T22:13:20.500000+00:00"));
    }

    #[test]
    fn string_microseconds_are_parsed() {
        let raw = json!({"Event": {"event_microsecond": "250000"}});
        let rendered = render(&json!(1_700_000_000), &raw);
        assert_eq!(rendered, json!("2023-11-14T22:13:20.250000+00:00"));
    }

    #[test]
    fn out_of_range_microseconds_fall_back_to_zero() {
        let raw = json!({"Event": {"event_microsecond": 5_000_000}});
        let rendered = render(&json!(1_700_000_000), &raw);
        assert_eq!(rendered, json!("2023-11-14T22:13:20+00:00"));
    }

    #[test]
    fn iso_string_passes_through() {
        let value = json!("2024-01-15T12:00:00.000000+0000");
        let rendered = render(&value, &json!({}));
        assert_eq!(rendered, value);
    }

    #[test]
    fn float_epoch_passes_through() {
        let value = json!(1_700_000_000.5);
        let rendered = render(&value, &json!({}));
        assert_eq!(rendered, value);
    }

    #[test]
    fn unrepresentable_epoch_passes_through() {
        let value = json!(i64::MAX);
        let rendered = render(&value, &json!({}));
        assert_eq!(rendered, value);
    }

    #[test]
    fn epoch_zero_renders_unix_origin() {
        let rendered = render(&json!(0), &json!({}));
        assert_eq!(rendered, json!("1970-01-01T00:00:00+00:00"));
    }
}

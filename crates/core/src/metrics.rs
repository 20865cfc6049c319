//! Prometheus 메트릭 이름과 HELP 텍스트 정의
//!
//! 파이프라인 전반에서 쓰는 메트릭 이름을 상수로 모아 둡니다.
//! 각 호출부는 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로에 이 상수를 그대로 넘기고,
//! 설명 등록은 데몬 기동 시 [`describe_all()`] 한 번으로 끝냅니다.
//!
//! # 이름 규칙
//!
//! - 공통 접두어 `watchpost_` 뒤에 모듈 구획이 붙습니다:
//!   `eve_pipeline_`, `stream_gateway_`, `daemon_`
//! - counter는 `_total`, 지연 히스토그램은 `_seconds`로 끝납니다.
//!   gauge에는 접미어를 붙이지 않습니다.
//!
//! # 사용 예시
//!
//! ```ignore
//! use watchpost_core::metrics as m;
//!
//! metrics::counter!(m::EVE_PIPELINE_LINES_COLLECTED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 ─────────────────────────────────────────────────────

/// 레코드의 `event_type` 값을 담는 레이블 키 (alert, dns, stats 등)
pub const LABEL_EVENT_TYPE: &str = "event_type";

// ─── eve-pipeline 메트릭 ───────────────────────────────────────────

/// eve 로그에서 읽어낸 완결 라인 수 (counter)
pub const EVE_PIPELINE_LINES_COLLECTED_TOTAL: &str = "watchpost_eve_pipeline_lines_collected_total";

/// JSON 디코딩에 실패한 라인 수 (counter)
pub const EVE_PIPELINE_PARSE_ERRORS_TOTAL: &str = "watchpost_eve_pipeline_parse_errors_total";

/// event_type 필터에 걸려 버려진 레코드 수 (counter, label: event_type)
pub const EVE_PIPELINE_EVENTS_EXCLUDED_TOTAL: &str =
    "watchpost_eve_pipeline_events_excluded_total";

/// 정규화 후 브로드캐스트 채널로 넘긴 알림 수 (counter)
pub const EVE_PIPELINE_ALERTS_SENT_TOTAL: &str = "watchpost_eve_pipeline_alerts_sent_total";

/// 레코드 한 건을 정규화해 넘기기까지 걸린 시간 (histogram, 초)
pub const EVE_PIPELINE_PROCESSING_DURATION_SECONDS: &str =
    "watchpost_eve_pipeline_processing_duration_seconds";

// ─── stream-gateway 메트릭 ─────────────────────────────────────────

/// 현재 연결된 대시보드 세션 수 (gauge)
pub const STREAM_GATEWAY_SESSIONS_ACTIVE: &str = "watchpost_stream_gateway_sessions_active";

/// 세션들로 플러시된 비어 있지 않은 배치 수 (counter)
pub const STREAM_GATEWAY_BATCHES_FLUSHED_TOTAL: &str =
    "watchpost_stream_gateway_batches_flushed_total";

/// 전체 세션에 전달된 알림 누계 (counter)
pub const STREAM_GATEWAY_ALERTS_DELIVERED_TOTAL: &str =
    "watchpost_stream_gateway_alerts_delivered_total";

/// 쓰기 실패로 끊어 낸 세션 수 (counter)
pub const STREAM_GATEWAY_DELIVERY_FAILURES_TOTAL: &str =
    "watchpost_stream_gateway_delivery_failures_total";

/// HTTP 배치 임포트 처리 횟수 (counter)
pub const STREAM_GATEWAY_IMPORTS_TOTAL: &str = "watchpost_stream_gateway_imports_total";

// ─── daemon 메트릭 ─────────────────────────────────────────────────

/// 기동 후 경과 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "watchpost_daemon_uptime_seconds";

/// 오케스트레이터에 등록된 플러그인 수 (gauge)
pub const DAEMON_PLUGINS_REGISTERED: &str = "watchpost_daemon_plugins_registered";

/// 빌드 정보 게이지, 값은 항상 1 (label: version)
pub const DAEMON_BUILD_INFO: &str = "watchpost_daemon_build_info";

// ─── 히스토그램 버킷 ───────────────────────────────────────────────

/// 정규화 지연 히스토그램의 버킷 경계 (초)
///
/// 10µs부터 1초까지 로그 스케일로 배치했습니다.
pub const PROCESSING_DURATION_BUCKETS: [f64; 10] = [
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 1.0,
];

// ─── 설명 등록 ─────────────────────────────────────────────────────

/// 설명 등록 시 사용할 매크로 구분
enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

/// 이름 / 종류 / HELP 텍스트 목록. [`describe_all()`]과 테스트가 공유합니다.
const METRIC_HELP: &[(&str, MetricKind, &str)] = &[
    (
        EVE_PIPELINE_LINES_COLLECTED_TOTAL,
        MetricKind::Counter,
        "Total number of complete lines read from the eve log",
    ),
    (
        EVE_PIPELINE_PARSE_ERRORS_TOTAL,
        MetricKind::Counter,
        "Total number of lines that failed JSON parsing",
    ),
    (
        EVE_PIPELINE_EVENTS_EXCLUDED_TOTAL,
        MetricKind::Counter,
        "Total number of records excluded by event type filtering",
    ),
    (
        EVE_PIPELINE_ALERTS_SENT_TOTAL,
        MetricKind::Counter,
        "Total number of normalized alerts sent to downstream consumers",
    ),
    (
        EVE_PIPELINE_PROCESSING_DURATION_SECONDS,
        MetricKind::Histogram,
        "Time to normalize and forward a single record in seconds",
    ),
    (
        STREAM_GATEWAY_SESSIONS_ACTIVE,
        MetricKind::Gauge,
        "Number of dashboard sessions currently connected",
    ),
    (
        STREAM_GATEWAY_BATCHES_FLUSHED_TOTAL,
        MetricKind::Counter,
        "Total number of non-empty alert batches broadcast to sessions",
    ),
    (
        STREAM_GATEWAY_ALERTS_DELIVERED_TOTAL,
        MetricKind::Counter,
        "Total number of alerts delivered across all sessions",
    ),
    (
        STREAM_GATEWAY_DELIVERY_FAILURES_TOTAL,
        MetricKind::Counter,
        "Total number of sessions pruned after a failed delivery",
    ),
    (
        STREAM_GATEWAY_IMPORTS_TOTAL,
        MetricKind::Counter,
        "Total number of batch import requests processed",
    ),
    (DAEMON_UPTIME_SECONDS, MetricKind::Gauge, "Watchpost daemon uptime in seconds"),
    (DAEMON_PLUGINS_REGISTERED, MetricKind::Gauge, "Number of plugins registered in the daemon"),
    (DAEMON_BUILD_INFO, MetricKind::Gauge, "Build information (always 1, with version label)"),
];

/// 모든 메트릭의 Prometheus HELP 텍스트를 등록합니다.
///
/// 전역 레코더를 설치한 직후, 데몬 기동 경로에서 한 번 호출합니다.
/// 레코더가 없는 상태에서 불러도 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    for (name, kind, help) in METRIC_HELP {
        match kind {
            MetricKind::Counter => describe_counter!(*name, *help),
            MetricKind::Gauge => describe_gauge!(*name, *help),
            MetricKind::Histogram => describe_histogram!(*name, *help),
        }
    }
}

//! watchpost.toml 로딩과 검증
//!
//! 최상위 구조체 [`WatchpostConfig`]가 모든 섹션을 담고, 각 모듈은
//! 자기 섹션만 꺼내 씁니다.
//!
//! # 설정 우선순위
//! CLI 인자가 가장 우선하고, 그다음이 `WATCHPOST_EVE_LOG_PATH=...`
//! 형식의 환경변수입니다. 환경변수가 없으면 `watchpost.toml` 값을,
//! 파일에도 없으면 `Default` 구현의 값을 씁니다.
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), watchpost_core::error::WatchpostError> {
//! use watchpost_core::config::WatchpostConfig;
//!
//! // 파일 + 환경변수 오버라이드
//! let config = WatchpostConfig::load("watchpost.toml").await?;
//!
//! // TOML 문자열만으로 파싱
//! let config = WatchpostConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, WatchpostError};

/// 전체 데몬 설정
///
/// `watchpost.toml`의 최상위 테이블과 일대일로 대응합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchpostConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// eve 파이프라인 설정
    #[serde(default)]
    pub eve: EveConfig,
    /// 스트림 게이트웨이 설정
    #[serde(default)]
    pub stream: StreamConfig,
    /// 메트릭 익스포터 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl WatchpostConfig {
    /// 파일을 읽고 환경변수 오버라이드까지 적용한 설정을 돌려줍니다.
    ///
    /// 오버라이드가 새 위반을 만들 수 있어 적용 후 한 번 더 검증합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, WatchpostError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일 내용만으로 설정을 만듭니다. 환경변수는 건드리지 않습니다.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, WatchpostError> {
        let path = path.as_ref();
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            Err(e) => return Err(WatchpostError::Io(e)),
        };
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열을 설정으로 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, WatchpostError> {
        toml::from_str(toml_str).map_err(|e| {
            ConfigError::ParseFailed {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// `WATCHPOST_{SECTION}_{FIELD}` 형식의 환경변수를 설정 위에 덮어씁니다.
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "WATCHPOST_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "WATCHPOST_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.pid_file, "WATCHPOST_GENERAL_PID_FILE");

        override_parsed(&mut self.eve.enabled, "WATCHPOST_EVE_ENABLED");
        override_string(&mut self.eve.log_path, "WATCHPOST_EVE_LOG_PATH");
        override_parsed(&mut self.eve.poll_interval_ms, "WATCHPOST_EVE_POLL_INTERVAL_MS");

        override_parsed(&mut self.stream.enabled, "WATCHPOST_STREAM_ENABLED");
        override_string(&mut self.stream.bind, "WATCHPOST_STREAM_BIND");
        override_parsed(
            &mut self.stream.flush_interval_ms,
            "WATCHPOST_STREAM_FLUSH_INTERVAL_MS",
        );

        override_parsed(&mut self.metrics.enabled, "WATCHPOST_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "WATCHPOST_METRICS_LISTEN_ADDR");
        override_parsed(&mut self.metrics.port, "WATCHPOST_METRICS_PORT");
    }

    /// 값 단위 유효성 검사. 비활성 섹션의 값은 검사하지 않습니다.
    pub fn validate(&self) -> Result<(), WatchpostError> {
        const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        const LOG_FORMATS: [&str; 2] = ["json", "pretty"];

        if !LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", LOG_LEVELS.join(", ")),
            ));
        }
        if !LOG_FORMATS.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", LOG_FORMATS.join(", ")),
            ));
        }

        if self.eve.enabled {
            if self.eve.log_path.is_empty() {
                return Err(invalid(
                    "eve.log_path",
                    "log_path must not be empty when eve is enabled".to_owned(),
                ));
            }
            if self.eve.poll_interval_ms == 0 {
                return Err(invalid(
                    "eve.poll_interval_ms",
                    "must be greater than zero".to_owned(),
                ));
            }
        }

        if self.stream.enabled {
            if self.stream.bind.parse::<std::net::SocketAddr>().is_err() {
                return Err(invalid(
                    "stream.bind",
                    format!("'{}' is not a valid socket address", self.stream.bind),
                ));
            }
            if self.stream.flush_interval_ms == 0 {
                return Err(invalid(
                    "stream.flush_interval_ms",
                    "must be greater than zero".to_owned(),
                ));
            }
        }

        if self.metrics.enabled {
            if self.metrics.listen_addr.parse::<std::net::IpAddr>().is_err() {
                return Err(invalid(
                    "metrics.listen_addr",
                    format!("'{}' is not a valid IP address", self.metrics.listen_addr),
                ));
            }
            if self.metrics.port == 0 {
                return Err(invalid(
                    "metrics.port",
                    "must be greater than zero".to_owned(),
                ));
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// PID 파일 경로
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            pid_file: "/var/run/watchpost.pid".to_owned(),
        }
    }
}

/// eve 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EveConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 추적할 eve.json 파일 경로
    pub log_path: String,
    /// 파일 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
}

impl Default for EveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_path: "/var/log/suricata/eve.json".to_owned(),
            poll_interval_ms: 200,
        }
    }
}

/// 스트림 게이트웨이 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// WebSocket/HTTP 수신 주소
    pub bind: String,
    /// 알림 배치 플러시 주기 (밀리초)
    pub flush_interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0:8088".to_owned(),
            flush_interval_ms: 1000,
        }
    }
}

/// 메트릭 익스포터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// Prometheus 익스포터 수신 IP
    pub listen_addr: String,
    /// Prometheus 익스포터 포트
    pub port: u16,
    /// 메트릭 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 검증/오버라이드 헬퍼 ---

fn invalid(field: &str, reason: String) -> WatchpostError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

/// FromStr로 파싱되는 타입 공용 오버라이드. 파싱에 실패하면 기존 값을
/// 유지하고 경고만 남깁니다.
fn override_parsed<T: FromStr>(target: &mut T, env_key: &str) {
    let Ok(raw) = std::env::var(env_key) else {
        return;
    };
    match raw.parse() {
        Ok(parsed) => *target = parsed,
        Err(_) => warn!(
            env_key,
            value = raw.as_str(),
            "ignoring unparseable env override"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(mutate: impl FnOnce(&mut WatchpostConfig), needle: &str) {
        let mut config = WatchpostConfig::default();
        mutate(&mut config);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(needle), "unexpected error: {err}");
    }

    #[test]
    fn defaults_point_at_suricata_paths() {
        let config = WatchpostConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert!(config.eve.enabled);
        assert_eq!(config.eve.log_path, "/var/log/suricata/eve.json");
        assert_eq!(config.eve.poll_interval_ms, 200);
        assert!(config.stream.enabled);
        assert_eq!(config.stream.bind, "0.0.0.0:8088");
        assert_eq!(config.stream.flush_interval_ms, 1000);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn defaults_validate_cleanly() {
        WatchpostConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_toml_falls_back_to_defaults() {
        let config = WatchpostConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.eve.log_path, "/var/log/suricata/eve.json");
    }

    #[test]
    fn partial_toml_keeps_unset_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[eve]
log_path = "/tmp/eve.json"
"#;
        let config = WatchpostConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.eve.log_path, "/tmp/eve.json");
        assert_eq!(config.eve.poll_interval_ms, 200);
    }

    #[test]
    fn full_toml_overrides_every_section() {
        let toml = r#"
[general]
log_level = "warn"
log_format = "pretty"
pid_file = "/opt/watchpost/watchpost.pid"

[eve]
enabled = true
log_path = "/srv/suricata/eve.json"
poll_interval_ms = 500

[stream]
enabled = true
bind = "127.0.0.1:9001"
flush_interval_ms = 250

[metrics]
enabled = true
listen_addr = "0.0.0.0"
port = 9200
endpoint = "/metrics"
"#;
        let config = WatchpostConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.eve.log_path, "/srv/suricata/eve.json");
        assert_eq!(config.eve.poll_interval_ms, 500);
        assert_eq!(config.stream.bind, "127.0.0.1:9001");
        assert_eq!(config.stream.flush_interval_ms, 250);
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.port, 9200);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = WatchpostConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            WatchpostError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_checks_log_level() {
        assert_invalid(|c| c.general.log_level = "verbose".to_owned(), "log_level");
    }

    #[test]
    fn validate_checks_log_format() {
        assert_invalid(|c| c.general.log_format = "xml".to_owned(), "log_format");
    }

    #[test]
    fn validate_requires_log_path_for_enabled_tail() {
        assert_invalid(|c| c.eve.log_path = String::new(), "log_path");
    }

    #[test]
    fn disabled_tail_skips_log_path_check() {
        let mut config = WatchpostConfig::default();
        config.eve.enabled = false;
        config.eve.log_path = String::new();
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        assert_invalid(|c| c.eve.poll_interval_ms = 0, "poll_interval_ms");
    }

    #[test]
    fn validate_rejects_malformed_bind() {
        assert_invalid(|c| c.stream.bind = "not-an-address".to_owned(), "stream.bind");
    }

    #[test]
    fn validate_rejects_zero_flush_interval() {
        assert_invalid(|c| c.stream.flush_interval_ms = 0, "flush_interval_ms");
    }

    #[test]
    fn validate_checks_metrics_listen_addr() {
        assert_invalid(
            |c| {
                c.metrics.enabled = true;
                c.metrics.listen_addr = "localhost".to_owned();
            },
            "listen_addr",
        );
    }

    #[test]
    fn validate_rejects_zero_metrics_port() {
        assert_invalid(
            |c| {
                c.metrics.enabled = true;
                c.metrics.port = 0;
            },
            "metrics.port",
        );
    }

    #[test]
    fn env_override_replaces_string_value() {
        let mut val = "original".to_owned();
        // SAFETY: 이 테스트만 쓰는 고유한 변수명이라 다른 테스트와 겹치지 않습니다.
        unsafe { std::env::set_var("TEST_WATCHPOST_STR", "overridden") };
        override_string(&mut val, "TEST_WATCHPOST_STR");
        unsafe { std::env::remove_var("TEST_WATCHPOST_STR") };
        assert_eq!(val, "overridden");
    }

    #[test]
    fn env_override_parses_typed_values() {
        let mut flag = false;
        let mut interval = 200u64;
        // SAFETY: 이 테스트만 쓰는 고유한 변수명이라 다른 테스트와 겹치지 않습니다.
        unsafe { std::env::set_var("TEST_WATCHPOST_BOOL", "true") };
        unsafe { std::env::set_var("TEST_WATCHPOST_U64", "500") };
        override_parsed(&mut flag, "TEST_WATCHPOST_BOOL");
        override_parsed(&mut interval, "TEST_WATCHPOST_U64");
        unsafe { std::env::remove_var("TEST_WATCHPOST_BOOL") };
        unsafe { std::env::remove_var("TEST_WATCHPOST_U64") };
        assert!(flag);
        assert_eq!(interval, 500);
    }

    #[test]
    fn env_override_keeps_value_on_parse_failure() {
        let mut flag = false;
        let mut interval = 200u64;
        // SAFETY: 이 테스트만 쓰는 고유한 변수명이라 다른 테스트와 겹치지 않습니다.
        unsafe { std::env::set_var("TEST_WATCHPOST_BOOL_BAD", "not-a-bool") };
        unsafe { std::env::set_var("TEST_WATCHPOST_U64_BAD", "soon") };
        override_parsed(&mut flag, "TEST_WATCHPOST_BOOL_BAD");
        override_parsed(&mut interval, "TEST_WATCHPOST_U64_BAD");
        unsafe { std::env::remove_var("TEST_WATCHPOST_BOOL_BAD") };
        unsafe { std::env::remove_var("TEST_WATCHPOST_U64_BAD") };
        assert!(!flag);
        assert_eq!(interval, 200);
    }

    #[test]
    fn env_override_ignores_missing_variable() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_WATCHPOST_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn serialized_defaults_parse_back() {
        let config = WatchpostConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = WatchpostConfig::parse(&toml_str).unwrap();
        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(config.eve.log_path, parsed.eve.log_path);
        assert_eq!(
            config.stream.flush_interval_ms,
            parsed.stream.flush_interval_ms
        );
    }

    #[tokio::test]
    async fn missing_file_is_a_config_error() {
        let err = WatchpostConfig::from_file("/nonexistent/path/watchpost.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WatchpostError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}

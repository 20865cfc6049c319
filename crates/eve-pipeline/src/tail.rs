//! eve.json 파일 tail 수집기
//!
//! Suricata가 쓰는 `eve.json`을 현재 끝 지점부터 추적합니다.
//! `tail -f`와 유사한 동작을 비동기 폴링으로 구현합니다.
//!
//! # 토너 쓰기(torn write) 처리
//! 개행으로 끝나지 않은 꼬리는 누적 버퍼에 보관했다가 다음 폴에서
//! 이어 붙입니다. 미완성 라인은 파싱되지도, 버려지지도 않습니다.

use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use watchpost_core::event::{MODULE_EVE_PIPELINE, RawEvent};
use watchpost_core::metrics as m;

use crate::config::EvePipelineConfig;
use crate::error::EvePipelineError;

/// eve tail 수집기 설정
#[derive(Debug, Clone)]
pub struct EveTailConfig {
    /// 감시할 eve.json 파일 경로
    pub log_path: PathBuf,
    /// 파일 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 미완성 라인 누적 버퍼 최대 크기 (바이트)
    pub max_line_length: usize,
}

impl Default for EveTailConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("/var/log/suricata/eve.json"),
            poll_interval_ms: 200,
            max_line_length: 1024 * 1024,
        }
    }
}

impl From<&EvePipelineConfig> for EveTailConfig {
    fn from(config: &EvePipelineConfig) -> Self {
        Self {
            log_path: PathBuf::from(&config.log_path),
            poll_interval_ms: config.poll_interval_ms,
            max_line_length: config.max_line_length,
        }
    }
}

/// eve.json tail 수집기
///
/// [`attach`](Self::attach)로 파일을 열어 끝으로 이동한 뒤,
/// [`run`](Self::run)을 별도 태스크에서 실행합니다. 열기 실패는
/// 치명적이며 파이프라인 시작 에러로 전파됩니다.
pub struct EveTailCollector {
    /// 수집기 설정
    config: EveTailConfig,
    /// 파싱된 원시 이벤트 전송 채널
    tx: mpsc::Sender<RawEvent>,
    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,
    /// attach()가 열어 둔 파일 핸들
    file: Option<File>,
    /// 개행을 기다리는 미완성 라인 누적 버퍼
    pending: Vec<u8>,
}

impl EveTailCollector {
    /// 새 tail 수집기를 생성합니다.
    pub fn new(
        config: EveTailConfig,
        tx: mpsc::Sender<RawEvent>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            tx,
            cancel_token,
            file: None,
            pending: Vec::new(),
        }
    }

    /// 파일을 열고 끝으로 이동합니다.
    ///
    /// 과거 기록은 재생하지 않습니다. 실패는 호출자에게 그대로
    /// 전파되어 파이프라인 시작을 중단시킵니다.
    pub async fn attach(&mut self) -> Result<(), EvePipelineError> {
        let mut file =
            File::open(&self.config.log_path)
                .await
                .map_err(|e| EvePipelineError::Collector {
                    source_type: "eve_tail".to_owned(),
                    reason: format!(
                        "failed to open {}: {}",
                        self.config.log_path.display(),
                        e
                    ),
                })?;

        let offset =
            file.seek(SeekFrom::End(0))
                .await
                .map_err(|e| EvePipelineError::Collector {
                    source_type: "eve_tail".to_owned(),
                    reason: format!("failed to seek to end of eve log: {e}"),
                })?;

        info!(
            path = %self.config.log_path.display(),
            offset,
            "attached to eve log at end of file"
        );
        self.file = Some(file);
        Ok(())
    }

    /// 폴링 루프를 실행합니다.
    ///
    /// `attach()` 이후 `tokio::spawn`으로 별도 태스크에서 호출하세요.
    /// 취소 신호는 한 폴 주기 안에 반영됩니다. 파일 핸들은 모든 종료
    /// 경로에서 해제됩니다.
    pub async fn run(mut self) -> Result<(), EvePipelineError> {
        let mut file = self.file.take().ok_or_else(|| EvePipelineError::Collector {
            source_type: "eve_tail".to_owned(),
            reason: "collector not attached".to_owned(),
        })?;

        let cancel = self.cancel_token.clone();
        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.drain_available(&mut file).await {
                        Ok(true) => {}
                        Ok(false) => {
                            info!("raw event channel closed, stopping eve tail collector");
                            break;
                        }
                        Err(e) => {
                            error!(error = %e, "eve log read failed, stopping collector");
                            return Err(e);
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("eve tail collector received shutdown signal");
                    break;
                }
            }
        }

        Ok(())
    }

    /// 파일에서 지금 읽을 수 있는 데이터를 모두 소비합니다.
    ///
    /// 완성된 라인만 파싱하며, 꼬리는 누적 버퍼에 남습니다.
    /// 반환값 false는 수신측 채널이 닫혔음을 뜻합니다.
    async fn drain_available(&mut self, file: &mut File) -> Result<bool, EvePipelineError> {
        let mut chunk = [0u8; 8192];
        loop {
            let n = file
                .read(&mut chunk)
                .await
                .map_err(|e| EvePipelineError::Collector {
                    source_type: "eve_tail".to_owned(),
                    reason: format!("read error: {e}"),
                })?;
            if n == 0 {
                break;
            }
            self.pending.extend_from_slice(&chunk[..n]);

            while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                if !self.forward_line(&line[..pos]).await {
                    return Ok(false);
                }
            }

            if self.pending.len() > self.config.max_line_length {
                warn!(
                    len = self.pending.len(),
                    max = self.config.max_line_length,
                    "partial line exceeds max length, discarding"
                );
                self.pending.clear();
            }
        }
        Ok(true)
    }

    /// 완성된 한 라인을 파싱해 처리 단계로 전달합니다.
    ///
    /// 잘못된 JSON과 비객체 값은 경고 후 건너뜁니다. 루프는 잘못된
    /// 입력으로 죽지 않습니다. 반환값 false는 채널이 닫혔음을 뜻합니다.
    async fn forward_line(&self, line: &[u8]) -> bool {
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            return true;
        }
        metrics::counter!(m::EVE_PIPELINE_LINES_COLLECTED_TOTAL).increment(1);

        match serde_json::from_slice::<serde_json::Value>(trimmed) {
            Ok(value) if value.is_object() => {
                let event = RawEvent::new(value, MODULE_EVE_PIPELINE);
                if self.tx.send(event).await.is_err() {
                    return false;
                }
            }
            Ok(_) => {
                metrics::counter!(m::EVE_PIPELINE_PARSE_ERRORS_TOTAL).increment(1);
                warn!("skipping non-object json line in eve log");
            }
            Err(e) => {
                metrics::counter!(m::EVE_PIPELINE_PARSE_ERRORS_TOTAL).increment(1);
                warn!(error = %e, "skipping malformed json line in eve log");
            }
        }
        true
    }
}

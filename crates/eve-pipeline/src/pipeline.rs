//! tail 수집과 정규화 처리를 하나의 플러그인으로 묶습니다.
//!
//! [`EvePipeline`]은 core의 [`Plugin`](watchpost_core::plugin::Plugin)
//! 생명주기(init/start/stop/health_check)를 구현하며, start 시점에 두 개의
//! 백그라운드 태스크를 스폰합니다.
//!
//! ```text
//! EveTailCollector --> raw 채널 --+
//!                                 |--> process_events --> 알림 채널
//! 게이트웨이 제출 채널 -----------+
//! ```

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use watchpost_core::error::{PipelineError, PluginError, WatchpostError};
use watchpost_core::event::{AlertEvent, RawEvent};
use watchpost_core::metrics as m;
use watchpost_core::plugin::{HealthStatus, Plugin, PluginInfo, PluginState, PluginType};

use crate::config::EvePipelineConfig;
use crate::error::EvePipelineError;
use crate::normalize;
use crate::tail::{EveTailCollector, EveTailConfig};

/// 알림 채널 기본 용량 (외부 채널 미사용 시)
const DEFAULT_ALERT_CHANNEL_CAPACITY: usize = 256;

/// 중지 시 태스크 종료 대기 시간
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// eve 알림 파이프라인 플러그인
///
/// [`EvePipelineBuilder`]로 조립하며, daemon이 다른 모듈과 같은 방식으로
/// init/start/stop을 호출합니다. start는 tail 수집기를 파일에 attach한 뒤
/// 수집 태스크와 처리 태스크를 스폰하고, stop은 취소 토큰을 당겨 두
/// 태스크가 내려갈 때까지 기다립니다.
pub struct EvePipeline {
    /// 플러그인 메타데이터
    info: PluginInfo,
    /// 파이프라인 설정
    config: EvePipelineConfig,
    /// 현재 생명주기 상태
    state: PluginState,
    /// 모든 백그라운드 태스크를 중단시키는 취소 토큰
    cancel_token: CancellationToken,
    /// 수집기에 전달되는 원시 이벤트 송신측
    raw_tx: mpsc::Sender<RawEvent>,
    /// 원시 이벤트 수신측 (start에서 처리 태스크로 이동)
    raw_rx: Option<mpsc::Receiver<RawEvent>>,
    /// 게이트웨이가 WebSocket으로 받은 제출 이벤트의 수신측. daemon이 연결해 줍니다.
    submission_rx: Option<mpsc::Receiver<RawEvent>>,
    /// 정규화된 알림의 송신측
    alert_tx: mpsc::Sender<AlertEvent>,
    /// 스폰한 태스크 핸들 (stop에서 join)
    tasks: Vec<JoinHandle<()>>,
}

impl EvePipeline {
    /// 파이프라인 설정에 대한 참조를 반환합니다.
    pub fn config(&self) -> &EvePipelineConfig {
        &self.config
    }
}

impl Plugin for EvePipeline {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn state(&self) -> PluginState {
        self.state
    }

    async fn init(&mut self) -> Result<(), WatchpostError> {
        if self.state != PluginState::Created {
            return Err(PluginError::InvalidState {
                name: self.info.name.clone(),
                current: self.state.to_string(),
                expected: PluginState::Created.to_string(),
            }
            .into());
        }

        self.config.validate().map_err(WatchpostError::from)?;
        self.state = PluginState::Initialized;
        Ok(())
    }

    async fn start(&mut self) -> Result<(), WatchpostError> {
        if self.state == PluginState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }
        if self.state != PluginState::Initialized {
            return Err(PluginError::InvalidState {
                name: self.info.name.clone(),
                current: self.state.to_string(),
                expected: PluginState::Initialized.to_string(),
            }
            .into());
        }

        info!("starting eve pipeline");

        // 파일 열기 실패는 여기서 잡아 시작 자체를 실패시킵니다
        let mut collector = EveTailCollector::new(
            EveTailConfig::from(&self.config),
            self.raw_tx.clone(),
            self.cancel_token.child_token(),
        );
        if let Err(e) = collector.attach().await {
            self.state = PluginState::Failed;
            return Err(e.into());
        }

        let raw_rx = self.raw_rx.take().ok_or_else(|| {
            WatchpostError::Pipeline(PipelineError::InitFailed(
                "raw event receiver already consumed".to_owned(),
            ))
        })?;

        let collector_task = tokio::spawn(async move {
            if let Err(e) = collector.run().await {
                tracing::error!(error = %e, "eve tail collector terminated with error");
            }
        });

        let processing_task = tokio::spawn(process_events(
            raw_rx,
            self.submission_rx.take(),
            self.alert_tx.clone(),
            self.cancel_token.child_token(),
        ));

        self.tasks.push(collector_task);
        self.tasks.push(processing_task);
        self.state = PluginState::Running;
        info!("eve pipeline started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), WatchpostError> {
        if self.state != PluginState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping eve pipeline");
        self.cancel_token.cancel();

        for mut task in self.tasks.drain(..) {
            match tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "pipeline task ended abnormally"),
                Err(_) => {
                    warn!("pipeline task did not stop in time, aborting");
                    task.abort();
                }
            }
        }

        self.state = PluginState::Stopped;
        info!("eve pipeline stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PluginState::Running => {
                if self.tasks.iter().any(|task| task.is_finished()) {
                    HealthStatus::Degraded("pipeline task exited early".to_owned())
                } else {
                    HealthStatus::Healthy
                }
            }
            PluginState::Created | PluginState::Initialized => {
                HealthStatus::Unhealthy("not started".to_owned())
            }
            PluginState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
            PluginState::Failed => HealthStatus::Unhealthy("failed".to_owned()),
        }
    }
}

/// 수집/제출 이벤트를 정규화해 알림 채널로 전달하는 처리 태스크
async fn process_events(
    mut raw_rx: mpsc::Receiver<RawEvent>,
    mut submission_rx: Option<mpsc::Receiver<RawEvent>>,
    alert_tx: mpsc::Sender<AlertEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            maybe = raw_rx.recv() => {
                match maybe {
                    Some(event) => {
                        if !handle_raw_event(event, &alert_tx).await {
                            break;
                        }
                    }
                    None => {
                        info!("raw event channel closed, stopping event processing");
                        break;
                    }
                }
            }
            maybe = recv_submission(&mut submission_rx) => {
                match maybe {
                    Some(event) => {
                        if !handle_raw_event(event, &alert_tx).await {
                            break;
                        }
                    }
                    None => {
                        // 제출 채널이 닫혀도 tail 경로는 계속 동작합니다
                        info!("submission channel closed");
                        submission_rx = None;
                    }
                }
            }
            _ = cancel.cancelled() => {
                info!("event processing received shutdown signal");
                break;
            }
        }
    }
}

/// 제출 채널이 없으면 영원히 대기해 select에서 비활성 브랜치가 됩니다.
async fn recv_submission(rx: &mut Option<mpsc::Receiver<RawEvent>>) -> Option<RawEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// 단일 원시 이벤트를 필터링/정규화해 전달합니다.
///
/// 반환값 false는 알림 채널이 닫혔음을 뜻합니다.
async fn handle_raw_event(event: RawEvent, alert_tx: &mpsc::Sender<AlertEvent>) -> bool {
    if !normalize::should_emit(&event.data) {
        let event_type = event.event_type().unwrap_or("unknown").to_owned();
        metrics::counter!(
            m::EVE_PIPELINE_EVENTS_EXCLUDED_TOTAL,
            m::LABEL_EVENT_TYPE => event_type
        )
        .increment(1);
        return true;
    }

    let started = Instant::now();
    let alert = normalize::normalize(&event.data);
    let alert_event = AlertEvent::with_trace(alert, event.metadata.trace_id.clone());
    metrics::histogram!(m::EVE_PIPELINE_PROCESSING_DURATION_SECONDS)
        .record(started.elapsed().as_secs_f64());

    if alert_tx.send(alert_event).await.is_err() {
        warn!("alert channel closed, stopping event processing");
        return false;
    }
    metrics::counter!(m::EVE_PIPELINE_ALERTS_SENT_TOTAL).increment(1);
    true
}

/// [`EvePipeline`] 조립용 빌더
///
/// raw 채널은 설정의 용량으로 빌더가 만듭니다. 알림 채널은 외부 송신측을
/// 받는 경로(daemon)와 빌더가 직접 만들어 수신측을 돌려주는 경로(단독
/// 사용, 테스트) 둘 다 지원합니다.
pub struct EvePipelineBuilder {
    config: EvePipelineConfig,
    alert_tx: Option<mpsc::Sender<AlertEvent>>,
    submission_rx: Option<mpsc::Receiver<RawEvent>>,
    alert_channel_capacity: usize,
}

impl EvePipelineBuilder {
    /// 기본 설정의 빌더
    pub fn new() -> Self {
        Self {
            config: EvePipelineConfig::default(),
            alert_tx: None,
            submission_rx: None,
            alert_channel_capacity: DEFAULT_ALERT_CHANNEL_CAPACITY,
        }
    }

    /// 파이프라인 설정
    pub fn config(mut self, config: EvePipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// stream-gateway가 WebSocket으로 받은 제출 이벤트의 수신측
    pub fn submission_receiver(mut self, rx: mpsc::Receiver<RawEvent>) -> Self {
        self.submission_rx = Some(rx);
        self
    }

    /// 알림을 내보낼 외부 채널. 지정하면 build는 수신측을 만들지 않습니다.
    pub fn alert_sender(mut self, tx: mpsc::Sender<AlertEvent>) -> Self {
        self.alert_tx = Some(tx);
        self
    }

    /// build가 알림 채널을 직접 만들 때 쓸 용량
    pub fn alert_channel_capacity(mut self, capacity: usize) -> Self {
        self.alert_channel_capacity = capacity;
        self
    }

    /// 설정을 검증하고 파이프라인을 조립합니다.
    ///
    /// 두 번째 반환값은 빌더가 만든 알림 수신측이며, [`alert_sender`]로
    /// 외부 채널을 지정한 경우에는 `None`입니다.
    ///
    /// [`alert_sender`]: Self::alert_sender
    ///
    /// # Errors
    /// 설정 검증에 실패하면 [`EvePipelineError::Config`]를 반환합니다.
    pub fn build(
        self,
    ) -> Result<(EvePipeline, Option<mpsc::Receiver<AlertEvent>>), EvePipelineError> {
        self.config.validate()?;

        let (raw_tx, raw_rx) = mpsc::channel(self.config.raw_channel_capacity);

        let (alert_tx, alert_rx) = match self.alert_tx {
            Some(tx) => (tx, None),
            None => {
                let (tx, rx) = mpsc::channel(self.alert_channel_capacity);
                (tx, Some(rx))
            }
        };

        let info = PluginInfo {
            name: "eve-pipeline".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            description: "Suricata eve.json 수집/정규화 파이프라인".to_owned(),
            plugin_type: PluginType::Pipeline,
        };

        let pipeline = EvePipeline {
            info,
            config: self.config,
            state: PluginState::Created,
            cancel_token: CancellationToken::new(),
            raw_tx,
            raw_rx: Some(raw_rx),
            submission_rx: self.submission_rx,
            alert_tx,
            tasks: Vec::new(),
        };

        Ok((pipeline, alert_rx))
    }
}

impl Default for EvePipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

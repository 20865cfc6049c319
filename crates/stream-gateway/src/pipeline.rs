//! HTTP 서버와 플러시 태스크를 하나의 플러그인으로 묶습니다.
//!
//! [`StreamGateway`]는 core의 [`Plugin`](watchpost_core::plugin::Plugin)
//! 생명주기를 구현합니다. start는 리스너를 바인딩한 뒤 axum 서버 태스크와
//! 플러시 태스크를 스폰하고, stop은 취소 토큰으로 둘 다 내립니다.
//!
//! ```text
//! 알림 채널 --> flush_alerts --> SessionRegistry --> 대시보드 세션
//!                                     ^
//!                axum 서버 (stream 업그레이드 / import)
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use watchpost_core::error::{PipelineError, PluginError, WatchpostError};
use watchpost_core::event::{AlertEvent, RawEvent};
use watchpost_core::metrics as m;
use watchpost_core::plugin::{HealthStatus, Plugin, PluginInfo, PluginState, PluginType};
use watchpost_core::types::Alert;

use crate::buffer::AlertBatch;
use crate::config::StreamGatewayConfig;
use crate::error::StreamGatewayError;
use crate::server::{GatewayState, router};
use crate::session::SessionRegistry;

/// 중지 시 태스크 종료 대기 시간
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// 배치 브로드캐스트 페이로드. 플러시마다 한 번 직렬화됩니다.
#[derive(Serialize)]
struct AlertsPayload<'a> {
    alerts: &'a [Alert],
}

/// 실시간 알림 게이트웨이 플러그인
///
/// 대시보드 WebSocket 세션을 받아들이고, 파이프라인이 보낸 알림을 플러시
/// 주기마다 한 번에 브로드캐스트합니다. WebSocket으로 제출된 이벤트는
/// 제출 채널을 통해 파이프라인으로 되돌립니다. [`StreamGatewayBuilder`]로
/// 조립하며 daemon이 생명주기를 관리합니다.
pub struct StreamGateway {
    /// 플러그인 메타데이터
    info: PluginInfo,
    /// 게이트웨이 설정
    config: StreamGatewayConfig,
    /// 현재 생명주기 상태
    state: PluginState,
    /// 모든 백그라운드 태스크를 중단시키는 취소 토큰
    cancel_token: CancellationToken,
    /// 연결된 세션 레지스트리
    registry: Arc<SessionRegistry>,
    /// 파이프라인 알림 수신 채널 (start에서 플러시 태스크로 이동)
    alert_rx: Option<mpsc::Receiver<AlertEvent>>,
    /// WebSocket 제출을 파이프라인으로 전달하는 채널
    submission_tx: Option<mpsc::Sender<RawEvent>>,
    /// 바인딩된 실제 주소 (start 이후 유효)
    local_addr: Option<SocketAddr>,
    /// 서버/플러시 태스크 핸들 (stop에서 join)
    tasks: Vec<JoinHandle<()>>,
}

impl StreamGateway {
    /// 게이트웨이 설정에 대한 참조를 반환합니다.
    pub fn config(&self) -> &StreamGatewayConfig {
        &self.config
    }

    /// 세션 레지스트리 핸들을 반환합니다.
    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }

    /// 바인딩된 실제 수신 주소를 반환합니다.
    ///
    /// 포트 0으로 바인딩한 경우 실제 할당된 포트를 확인할 때 사용합니다.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl Plugin for StreamGateway {
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

        info!(bind = %self.config.bind, "starting stream gateway");

        let alert_rx = self.alert_rx.take().ok_or_else(|| {
            WatchpostError::Pipeline(PipelineError::InitFailed(
                "alert receiver already consumed".to_owned(),
            ))
        })?;

        // 바인딩 실패는 여기서 잡아 시작 자체를 실패시킵니다
        let listener = match TcpListener::bind(&self.config.bind).await {
            Ok(listener) => listener,
            Err(e) => {
                self.state = PluginState::Failed;
                return Err(StreamGatewayError::Bind {
                    addr: self.config.bind.clone(),
                    reason: e.to_string(),
                }
                .into());
            }
        };
        self.local_addr = listener.local_addr().ok();

        let app = router(
            GatewayState {
                registry: Arc::clone(&self.registry),
                submission_tx: self.submission_tx.clone(),
            },
            self.config.max_import_bytes,
        );

        let shutdown = self.cancel_token.child_token();
        let server_task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await;
            if let Err(e) = result {
                error!(error = %e, "gateway server terminated with error");
            }
        });

        let flush_task = tokio::spawn(flush_alerts(
            alert_rx,
            Arc::clone(&self.registry),
            self.config.flush_interval_ms,
            self.cancel_token.child_token(),
        ));

        self.tasks.push(server_task);
        self.tasks.push(flush_task);
        self.state = PluginState::Running;
        info!(addr = ?self.local_addr, "stream gateway started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), WatchpostError> {
        if self.state != PluginState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping stream gateway");
        self.cancel_token.cancel();

        for mut task in self.tasks.drain(..) {
            match tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "gateway task ended abnormally"),
                Err(_) => {
                    warn!("gateway task did not stop in time, aborting");
                    task.abort();
                }
            }
        }

        self.state = PluginState::Stopped;
        info!("stream gateway stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PluginState::Running => {
                if self.tasks.iter().any(|task| task.is_finished()) {
                    HealthStatus::Degraded("gateway task exited early".to_owned())
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

/// 알림을 모아 주기마다 한 번에 브로드캐스트하는 플러시 태스크
async fn flush_alerts(
    mut alert_rx: mpsc::Receiver<AlertEvent>,
    registry: Arc<SessionRegistry>,
    flush_interval_ms: u64,
    cancel: CancellationToken,
) {
    let mut batch = AlertBatch::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(flush_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            maybe = alert_rx.recv() => {
                match maybe {
                    Some(event) => batch.push(event.alert),
                    None => {
                        info!("alert channel closed, stopping flush task");
                        flush(&mut batch, &registry).await;
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                flush(&mut batch, &registry).await;
            }
            _ = cancel.cancelled() => {
                info!("flush task received shutdown signal");
                flush(&mut batch, &registry).await;
                break;
            }
        }
    }
}

/// 비어 있지 않은 배치를 단일 페이로드로 직렬화해 전송합니다.
///
/// 빈 배치는 아무것도 전송하지 않습니다.
async fn flush(batch: &mut AlertBatch, registry: &SessionRegistry) {
    if batch.is_empty() {
        return;
    }

    let alerts = batch.take();
    match serde_json::to_string(&AlertsPayload { alerts: &alerts }) {
        Ok(payload) => {
            registry.broadcast(&payload).await;
            metrics::counter!(m::STREAM_GATEWAY_BATCHES_FLUSHED_TOTAL).increment(1);
        }
        Err(e) => warn!(error = %e, count = alerts.len(), "failed to serialize alert batch"),
    }
}

/// [`StreamGateway`] 조립용 빌더
///
/// 알림 수신 채널은 필수입니다. 제출 채널은 선택이며, 없으면 게이트웨이는
/// 브로드캐스트 전용으로 동작합니다.
pub struct StreamGatewayBuilder {
    config: StreamGatewayConfig,
    alert_rx: Option<mpsc::Receiver<AlertEvent>>,
    submission_tx: Option<mpsc::Sender<RawEvent>>,
}

impl StreamGatewayBuilder {
    /// 기본 설정의 빌더
    pub fn new() -> Self {
        Self {
            config: StreamGatewayConfig::default(),
            alert_rx: None,
            submission_tx: None,
        }
    }

    /// 게이트웨이 설정
    pub fn config(mut self, config: StreamGatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// 파이프라인이 보내는 알림의 수신측 (필수)
    pub fn alert_receiver(mut self, rx: mpsc::Receiver<AlertEvent>) -> Self {
        self.alert_rx = Some(rx);
        self
    }

    /// 제출 이벤트를 파이프라인으로 되돌릴 송신측.
    /// 없으면 제출 프레임은 경고만 남기고 버려집니다.
    pub fn submission_sender(mut self, tx: mpsc::Sender<RawEvent>) -> Self {
        self.submission_tx = Some(tx);
        self
    }

    /// 설정을 검증하고 게이트웨이를 조립합니다.
    ///
    /// # Errors
    /// 설정 검증에 실패하거나 [`alert_receiver`]가 지정되지 않으면
    /// [`StreamGatewayError::Config`]를 반환합니다.
    ///
    /// [`alert_receiver`]: Self::alert_receiver
    pub fn build(self) -> Result<StreamGateway, StreamGatewayError> {
        self.config.validate()?;

        let alert_rx = self.alert_rx.ok_or_else(|| StreamGatewayError::Config {
            field: "alert_receiver".to_owned(),
            reason: "alert receiver channel is required".to_owned(),
        })?;

        let info = PluginInfo {
            name: "stream-gateway".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            description: "실시간 알림 WebSocket 게이트웨이".to_owned(),
            plugin_type: PluginType::Gateway,
        };

        Ok(StreamGateway {
            info,
            config: self.config,
            state: PluginState::Created,
            cancel_token: CancellationToken::new(),
            registry: Arc::new(SessionRegistry::new()),
            alert_rx: Some(alert_rx),
            submission_tx: self.submission_tx,
            local_addr: None,
            tasks: Vec::new(),
        })
    }
}

impl Default for StreamGatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

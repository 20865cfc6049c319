//! HTTP/WebSocket 라우팅과 세션 처리
//!
//! - `GET /api/alerts/stream`: 대시보드 WebSocket 업그레이드
//! - `POST /api/alerts/import`: eve 캡처 파일 일괄 가져오기

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{DefaultBodyLimit, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use watchpost_core::event::{MODULE_STREAM_GATEWAY, RawEvent};
use watchpost_core::metrics as m;
use watchpost_eve_pipeline::import_events;

use crate::session::SessionRegistry;

/// 라우터 핸들러가 공유하는 상태
#[derive(Clone)]
pub(crate) struct GatewayState {
    /// 연결된 세션 레지스트리
    pub(crate) registry: Arc<SessionRegistry>,
    /// WebSocket 제출을 eve 파이프라인으로 전달하는 채널
    pub(crate) submission_tx: Option<mpsc::Sender<RawEvent>>,
}

/// 게이트웨이 HTTP/WebSocket 라우터를 구성합니다.
pub(crate) fn router(state: GatewayState, max_import_bytes: usize) -> Router {
    Router::new()
        .route("/api/alerts/stream", get(stream_handler))
        .route("/api/alerts/import", post(import_handler))
        .layer(DefaultBodyLimit::max(max_import_bytes))
        .with_state(state)
}

async fn stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// 연결 직후 세션에 전송하는 확인 메시지
pub(crate) fn connect_ack() -> String {
    json!({"message": "Connected to real-time alerts"}).to_string()
}

/// 수신 텍스트 프레임 분류 결과
pub(crate) enum Inbound {
    /// "ping" 연결 확인 프레임
    Ping,
    /// 파이프라인에 제출할 JSON 객체
    Submission(Value),
    /// 무시 대상 (JSON이 아니거나 객체가 아님)
    Ignored,
}

/// 수신 텍스트 프레임을 분류합니다.
pub(crate) fn classify_inbound(text: &str) -> Inbound {
    if text == "ping" {
        return Inbound::Ping;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) if value.is_object() => Inbound::Submission(value),
        _ => Inbound::Ignored,
    }
}

/// 단일 대시보드 WebSocket 세션을 처리합니다.
///
/// 세션 등록 -> 연결 확인 전송 -> 송수신 루프 -> 세션 해제 순서로
/// 진행되며, 어느 경로로 종료되든 세션은 레지스트리에서 제거됩니다.
async fn handle_socket(mut socket: WebSocket, state: GatewayState) {
    let (session_id, mut outbound_rx) = state.registry.register().await;
    info!(session_id = %session_id, "dashboard session connected");

    if socket.send(Message::Text(connect_ack())).await.is_err() {
        state.registry.deregister(&session_id).await;
        return;
    }

    loop {
        tokio::select! {
            maybe = outbound_rx.recv() => {
                match maybe {
                    Some(payload) => {
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    // 브로드캐스트 중 정리된 세션
                    None => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match classify_inbound(&text) {
                            Inbound::Ping => {
                                if socket.send(Message::Text("pong".to_owned())).await.is_err() {
                                    break;
                                }
                            }
                            Inbound::Submission(value) => submit(&state, value).await,
                            Inbound::Ignored => {
                                debug!(session_id = %session_id, "ignoring non-object frame");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // Binary/Ping/Pong 프레임 무시
                    Some(Err(e)) => {
                        warn!(session_id = %session_id, error = %e, "websocket receive error");
                        break;
                    }
                }
            }
        }
    }

    state.registry.deregister(&session_id).await;
    info!(session_id = %session_id, "dashboard session disconnected");
}

/// WebSocket으로 제출된 이벤트를 파이프라인에 전달합니다.
async fn submit(state: &GatewayState, value: Value) {
    let Some(tx) = &state.submission_tx else {
        warn!("submission received but no pipeline attached");
        return;
    };

    let event = RawEvent::new(value, MODULE_STREAM_GATEWAY);
    if tx.send(event).await.is_err() {
        warn!("submission channel closed, dropping event");
    }
}

async fn import_handler(body: String) -> impl IntoResponse {
    import_response(&body)
}

/// 가져오기 요청 본문을 처리해 HTTP 응답을 만듭니다.
pub(crate) fn import_response(body: &str) -> (StatusCode, Json<Value>) {
    match import_events(body) {
        Ok(alerts) => {
            metrics::counter!(m::STREAM_GATEWAY_IMPORTS_TOTAL).increment(1);
            info!(count = alerts.len(), "imported alert batch");
            (StatusCode::OK, Json(json!({ "alerts": alerts })))
        }
        Err(e) => {
            warn!(error = %e, "import request rejected");
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
        }
    }
}

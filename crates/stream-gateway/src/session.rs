//! WebSocket 세션 레지스트리
//!
//! 연결된 대시보드 세션을 추적하고 배치 페이로드를 브로드캐스트합니다.
//! 전송은 best-effort이며 느리거나 닫힌 세션이 다른 세션의 전송을
//! 막지 않도록 세션별 unbounded 채널을 사용합니다.

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use watchpost_core::metrics as m;

/// 연결된 대시보드 세션 목록
///
/// 각 세션은 고유 ID와 송신 채널로 등록됩니다. 닫힌 세션은
/// 브로드캐스트 중 전송 실패로 감지되어 정리됩니다.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, mpsc::UnboundedSender<String>>>,
}

impl SessionRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// 새 세션을 등록하고 세션 ID와 수신 채널을 반환합니다.
    pub async fn register(&self) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        let mut sessions = self.sessions.write().await;
        sessions.insert(id, tx);
        metrics::gauge!(m::STREAM_GATEWAY_SESSIONS_ACTIVE).set(sessions.len() as f64);
        debug!(session_id = %id, total = sessions.len(), "session registered");

        (id, rx)
    }

    /// 세션을 레지스트리에서 제거합니다.
    pub async fn deregister(&self, id: &Uuid) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(id).is_some() {
            metrics::gauge!(m::STREAM_GATEWAY_SESSIONS_ACTIVE).set(sessions.len() as f64);
            debug!(session_id = %id, total = sessions.len(), "session deregistered");
        }
    }

    /// 현재 연결된 세션 수
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// 모든 세션에 페이로드를 전송합니다.
    ///
    /// 전송 실패한 세션(연결 종료)은 브로드캐스트 후 제거됩니다.
    pub async fn broadcast(&self, payload: &str) {
        let mut dead = Vec::new();

        {
            let sessions = self.sessions.read().await;
            for (id, tx) in sessions.iter() {
                if tx.send(payload.to_owned()).is_ok() {
                    metrics::counter!(m::STREAM_GATEWAY_ALERTS_DELIVERED_TOTAL).increment(1);
                } else {
                    metrics::counter!(m::STREAM_GATEWAY_DELIVERY_FAILURES_TOTAL).increment(1);
                    dead.push(*id);
                }
            }
        }

        if !dead.is_empty() {
            let mut sessions = self.sessions.write().await;
            for id in &dead {
                sessions.remove(id);
            }
            metrics::gauge!(m::STREAM_GATEWAY_SESSIONS_ACTIVE).set(sessions.len() as f64);
            warn!(pruned = dead.len(), "pruned closed sessions");
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

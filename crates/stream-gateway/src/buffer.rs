//! 알림 배치 버퍼
//!
//! 플러시 주기 동안 도착한 알림을 모아두었다가 한 번에 꺼내는 버퍼입니다.
//! 세션마다 개별 전송하는 대신 주기당 한 번의 직렬화/브로드캐스트로
//! 전송 횟수를 줄입니다.

use watchpost_core::types::Alert;

/// 플러시 주기 동안 알림을 모아두는 배치 버퍼
#[derive(Debug, Default)]
pub struct AlertBatch {
    alerts: Vec<Alert>,
}

impl AlertBatch {
    /// 빈 배치를 생성합니다.
    pub fn new() -> Self {
        Self { alerts: Vec::new() }
    }

    /// 알림을 배치 끝에 추가합니다. 도착 순서가 유지됩니다.
    pub fn push(&mut self, alert: Alert) {
        self.alerts.push(alert);
    }

    /// 쌓인 알림을 모두 꺼내고 버퍼를 비웁니다.
    pub fn take(&mut self) -> Vec<Alert> {
        std::mem::take(&mut self.alerts)
    }

    /// 현재 쌓인 알림 수
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// 배치가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

//! 모듈 사이에 오가는 정규화 알림 스키마
//!
//! Suricata eve.json의 다양한 레코드 형태를 대시보드가 소비하는
//! 단일 평면 스키마로 통일합니다. 파이프라인이 만들고 게이트웨이와
//! CLI가 소비합니다.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 정규화된 보안 알림
///
/// eve.json 레코드를 평탄화한 대시보드 스키마입니다.
/// 원본 레코드의 형태와 무관하게 항상 동일한 키 집합으로 직렬화되며,
/// 해석할 수 없는 필드는 null로 남습니다. `original`은 원본 레코드를
/// 그대로 보존하는 유일한 필수 필드입니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// 발생 시각 — 도출 가능하면 ISO-8601 문자열, 아니면 원본 값 그대로
    pub timestamp: Option<Value>,
    /// 출발지 IP
    pub src_ip: Option<String>,
    /// 목적지 IP
    pub dest_ip: Option<String>,
    /// 출발지 포트
    pub src_port: Option<u16>,
    /// 목적지 포트
    pub dest_port: Option<u16>,
    /// 탐지 시그니처 (규칙 메시지)
    pub signature: Option<String>,
    /// 시그니처 식별자 — 숫자 원본은 "signature ID:{n}" 형태로 표기
    pub signature_id: Option<String>,
    /// 생성기 ID (원본 타입 그대로 전달)
    pub gid: Option<Value>,
    /// 심각도 — 원본 숫자 값 그대로 (스케일 변환 없음, 낮을수록 심각)
    pub severity: Option<serde_json::Number>,
    /// 프로토콜
    pub protocol: Option<String>,
    /// 패킷 처리 액션 (allowed, blocked 등)
    pub action: Option<String>,
    /// 패킷 번호 (원본 타입 그대로 전달)
    pub pkt_num: Option<Value>,
    /// 원본 레코드 전체
    pub original: Value,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signature = self.signature.as_deref().unwrap_or("-");
        let src = self.src_ip.as_deref().unwrap_or("?");
        let dest = self.dest_ip.as_deref().unwrap_or("?");
        match &self.severity {
            Some(sev) => write!(f, "[sev={sev}] {signature} ({src} -> {dest})"),
            None => write!(f, "[sev=-] {signature} ({src} -> {dest})"),
        }
    }
}

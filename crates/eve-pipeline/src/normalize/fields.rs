//! 필드 폴백 체인 테이블
//!
//! 각 출력 필드는 순서가 있는 조회 경로 목록으로 정의됩니다.
//! 체인은 데이터이며, 해석기는 첫 번째 NON-NULL 후보를 선택합니다.
//! 값이 falsy(0, 빈 문자열)여도 존재하면 채택됩니다.

use serde_json::Value;

/// 단일 조회 경로
///
/// 루트 레코드, 바인딩된 alert 섹션, `raw.Event` 세 네임스페이스 중
/// 하나에서 키를 찾습니다.
#[derive(Debug, Clone, Copy)]
pub(super) enum FieldRef {
    /// 루트 레코드의 키
    Root(&'static str),
    /// 바인딩된 alert 섹션의 키
    Section(&'static str),
    /// `raw.Event`의 키
    Event(&'static str),
}

pub(super) const SRC_IP: &[FieldRef] = &[
    FieldRef::Root("src_ip"),
    FieldRef::Root("src_addr"),
    FieldRef::Root("src_host"),
    FieldRef::Section("ip_source"),
    FieldRef::Event("ip_source"),
];

pub(super) const DEST_IP: &[FieldRef] = &[
    FieldRef::Root("dest_ip"),
    FieldRef::Root("dst_ip"),
    FieldRef::Root("dst_addr"),
    FieldRef::Root("dst_host"),
    FieldRef::Section("ip_destination"),
    FieldRef::Event("ip_dest"),
];

pub(super) const SRC_PORT: &[FieldRef] = &[
    FieldRef::Root("src_port"),
    FieldRef::Root("sport"),
    FieldRef::Section("src_port"),
    FieldRef::Event("src_port"),
];

pub(super) const DEST_PORT: &[FieldRef] = &[
    FieldRef::Root("dest_port"),
    FieldRef::Root("dport"),
    FieldRef::Section("dest_port"),
    FieldRef::Event("dest_port"),
];

pub(super) const SEVERITY: &[FieldRef] = &[
    FieldRef::Section("severity"),
    FieldRef::Section("priority"),
    FieldRef::Root("severity"),
    FieldRef::Root("priority"),
    FieldRef::Event("priority_id"),
];

pub(super) const PROTOCOL: &[FieldRef] = &[
    FieldRef::Root("proto"),
    FieldRef::Root("protocol"),
    FieldRef::Section("protocol"),
    FieldRef::Section("ip_proto"),
    FieldRef::Event("ip_proto"),
];

pub(super) const SIGNATURE: &[FieldRef] = &[
    FieldRef::Section("signature"),
    FieldRef::Root("signature"),
    FieldRef::Root("msg"),
    FieldRef::Root("rule"),
    FieldRef::Root("class"),
];

pub(super) const SIGNATURE_ID: &[FieldRef] = &[
    FieldRef::Section("signature_id"),
    FieldRef::Root("sid"),
    FieldRef::Section("sig_id"),
    FieldRef::Event("signature_id"),
];

pub(super) const GID: &[FieldRef] = &[
    FieldRef::Section("gid"),
    FieldRef::Root("gid"),
    FieldRef::Event("generator_id"),
];

pub(super) const PKT_NUM: &[FieldRef] = &[
    FieldRef::Root("pkt_num"),
    FieldRef::Event("event_id"),
    FieldRef::Root("event_id"),
];

pub(super) const ACTION: &[FieldRef] = &[
    FieldRef::Root("action"),
    FieldRef::Section("packet_action"),
    FieldRef::Event("packet_action"),
];

pub(super) const TIMESTAMP: &[FieldRef] = &[
    FieldRef::Root("timestamp"),
    FieldRef::Root("time"),
    FieldRef::Section("timestamp"),
    FieldRef::Event("event_second"),
];

/// 체인을 순서대로 해석해 첫 번째 NON-NULL 후보를 반환합니다.
pub(super) fn resolve<'a>(
    raw: &'a Value,
    section: &'a Value,
    chain: &[FieldRef],
) -> Option<&'a Value> {
    for field in chain {
        let candidate = match field {
            FieldRef::Root(key) => raw.get(key),
            FieldRef::Section(key) => section.get(key),
            FieldRef::Event(key) => raw.get("Event").and_then(|event| event.get(key)),
        };
        if let Some(value) = candidate {
            if !value.is_null() {
                return Some(value);
            }
        }
    }
    None
}

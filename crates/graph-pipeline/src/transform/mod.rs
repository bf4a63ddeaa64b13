//! 형식별 transformer — 원시 이벤트를 노드/엣지로 변환합니다.
//!
//! 각 transformer는 core의 [`Transform`](casegraph_core::pipeline::Transform)
//! trait을 구현하며, 형식별 판별자 필드를 검사해 하위 핸들러로
//! 분기합니다. 인식하지 못한 이벤트 타입은 빈 목록(no-op)이고,
//! 필수 필드 누락은 이벤트 단위 에러입니다.
//!
//! # 지원 형식
//! - [`GenericTransformer`]: 정규화 스키마 (필드명 상수 기반)
//! - [`SysmonTransformer`]: Sysmon EVTX 이벤트 (EventID 판별)
//! - [`EvtxTransformer`]: Windows Security 이벤트 로그 (4688, 상태 유지)
//! - [`ProcmonTransformer`]: Process Monitor CSV 이벤트
//! - [`FireEyeHxTransformer`]: FireEye HX Triage 에이전트 이벤트
//! - [`FireEyeAxTransformer`]: FireEye AX 샌드박스 리포트
//! - [`DarpaTcTransformer`]: DARPA Transparent Computing (UUID 식별)
//! - [`PcapTransformer`]: 패킷 캡처 요약 레코드

pub mod darpa_tc;
pub mod evtx;
pub mod fireeye_ax;
pub mod fireeye_hx;
pub mod generic;
pub mod pcap;
pub mod procmon;
pub mod sysmon;

pub use darpa_tc::DarpaTcTransformer;
pub use evtx::EvtxTransformer;
pub use fireeye_ax::FireEyeAxTransformer;
pub use fireeye_hx::FireEyeHxTransformer;
pub use generic::GenericTransformer;
pub use pcap::PcapTransformer;
pub use procmon::ProcmonTransformer;
pub use sysmon::SysmonTransformer;

use std::collections::HashMap;

use casegraph_core::event::Event;

/// 이벤트의 해시 객체 필드를 알고리즘→값 맵으로 읽습니다.
///
/// 필드가 없거나 객체가 아니면 빈 맵을 반환합니다.
pub(crate) fn hash_map_field(event: &Event, field: &str) -> HashMap<String, String> {
    event
        .get_map(field)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_owned())))
                .collect()
        })
        .unwrap_or_default()
}

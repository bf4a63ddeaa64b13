//! Windows Security 이벤트 로그(EVTX) transformer
//!
//! 4688(프로세스 생성) 이벤트를 노드로 변환합니다. Security 로그에는
//! 부모 프로세스의 PID만 있고 이미지 경로가 없으므로, 실행 중 관찰한
//! PID→프로세스 맵을 유지하여 부모의 생성 이벤트를 먼저 봤다면 전체
//! 속성으로 부모를 복원합니다. 본 적 없는 부모는 호스트와 PID만 가진
//! 최소 플레이스홀더 노드로 합성합니다.
//!
//! # 상태와 동시성
//!
//! 조회 맵은 생성자 주입 인스턴스 상태이며, 이벤트가 스트림 순서대로
//! 소비될 때만 부모 해석이 신뢰할 수 있습니다. 그래서
//! [`Transform::worker_limit`]이 1을 반환하여 파이프라인이 소비자
//! 풀을 하나로 제한합니다.

use std::collections::HashMap;
use std::sync::Mutex;

use casegraph_core::edge::EdgeOccurrence;
use casegraph_core::error::TransformError;
use casegraph_core::event::Event;
use casegraph_core::node::{GraphNode, Node, Process};
use casegraph_core::path::split_path;
use casegraph_core::pipeline::Transform;

/// Windows Security 이벤트 로그 transformer (상태 유지)
#[derive(Debug, Default)]
pub struct EvtxTransformer {
    /// 이번 실행에서 관찰한 PID→프로세스 스냅샷
    seen: Mutex<HashMap<i64, Process>>,
}

impl EvtxTransformer {
    /// 빈 조회 맵으로 transformer를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 준비된 조회 맵으로 transformer를 생성합니다.
    ///
    /// 이전 캡처에서 이어지는 스트림을 처리할 때 사용합니다.
    pub fn with_seen(seen: HashMap<i64, Process>) -> Self {
        Self {
            seen: Mutex::new(seen),
        }
    }

    /// EventID 4688: 프로세스 생성.
    fn process_creation(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let host = event.require_string("computer")?;

        let (image, image_path) = split_path(event.require_str("eventdata_newprocessname")?);
        let child_pid = parse_pid(event, "eventdata_newprocessid")?;
        let child = Process {
            host: Some(host.clone()),
            user: event.get_string("eventdata_subjectusername"),
            process_id: Some(child_pid),
            process_image: Some(image),
            process_image_path: Some(image_path),
            command_line: event.get_string("eventdata_commandline"),
            ..Default::default()
        };
        let mut child_file = child.file_node();
        child_file.file_of.touch(child.key());

        let parent_pid = parse_pid(event, "eventdata_processid")?;
        let mut seen = self
            .seen
            .lock()
            .map_err(|_| TransformError::Malformed("process lookup state poisoned".to_owned()))?;

        // 부모의 생성 이벤트를 먼저 봤다면 전체 속성으로 복원,
        // 아니면 PID와 호스트만 가진 플레이스홀더를 합성합니다.
        let mut parent = seen.get(&parent_pid).cloned().unwrap_or_else(|| Process {
            host: Some(host.clone()),
            process_id: Some(parent_pid),
            ..Default::default()
        });

        parent.launched.append(
            child.key(),
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("epoch")),
        );

        seen.insert(child_pid, child.bare_clone());
        drop(seen);

        Ok(vec![child.into(), child_file.into(), parent.into()])
    }
}

impl Transform for EvtxTransformer {
    fn name(&self) -> &str {
        "evtx"
    }

    fn transform(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let Some(event_id) = event.get_i64("event_id") else {
            return Ok(Vec::new());
        };

        match event_id {
            4688 => self.process_creation(event),
            _ => Ok(Vec::new()),
        }
    }

    fn worker_limit(&self) -> Option<usize> {
        // PID→프로세스 맵이 스트림 순서에 의존하므로 단일 소비자 강제
        Some(1)
    }
}

/// PID 필드를 파싱합니다. Security 로그는 16진수 문자열("0x3c8")로
/// PID를 기록하므로 10진수/16진수 모두 허용합니다.
fn parse_pid(event: &Event, field: &str) -> Result<i64, TransformError> {
    if let Some(pid) = event.get_i64(field) {
        return Ok(pid);
    }

    let raw = event.require_str(field)?.trim();
    let hex = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| TransformError::invalid(field, "expected decimal or hex pid"))?;
    i64::from_str_radix(hex, 16).map_err(|_| TransformError::invalid(field, "invalid hex pid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creation_event(new_pid: &str, parent_pid: &str, image: &str) -> Event {
        Event::new()
            .with("event_id", 4688)
            .with("computer", "ws-01")
            .with("eventdata_newprocessname", image)
            .with("eventdata_newprocessid", new_pid)
            .with("eventdata_processid", parent_pid)
            .with("eventdata_subjectusername", "admin")
            .with("epoch", 1000)
    }

    #[test]
    fn unknown_event_id_is_noop() {
        let transformer = EvtxTransformer::new();
        let event = Event::new().with("event_id", 4624);
        assert!(transformer.transform(&event).unwrap().is_empty());
    }

    #[test]
    fn worker_limit_is_one() {
        assert_eq!(EvtxTransformer::new().worker_limit(), Some(1));
    }

    #[test]
    fn unseen_parent_becomes_placeholder() {
        let transformer = EvtxTransformer::new();
        let nodes = transformer
            .transform(&creation_event("0x1f4", "0x64", "C:\\Temp\\child.exe"))
            .unwrap();
        assert_eq!(nodes.len(), 3);

        let child = nodes[0].as_process().unwrap();
        let parent = nodes[2].as_process().unwrap();

        assert_eq!(child.process_id, Some(0x1f4));
        assert_eq!(child.process_image.as_deref(), Some("child.exe"));

        // 플레이스홀더: 호스트와 PID만
        assert_eq!(parent.process_id, Some(0x64));
        assert_eq!(parent.host.as_deref(), Some("ws-01"));
        assert_eq!(parent.process_image, None);

        let occs = parent.launched.occurrences(&child.key()).unwrap();
        assert_eq!(occs[0].timestamp, Some(1000));
    }

    #[test]
    fn seen_parent_is_resolved_with_full_attributes() {
        let transformer = EvtxTransformer::new();

        // 먼저 부모(0x64)의 생성 이벤트를 관찰
        transformer
            .transform(&creation_event("0x64", "0x4", "C:\\Windows\\explorer.exe"))
            .unwrap();

        // 그 부모가 자식을 실행
        let nodes = transformer
            .transform(&creation_event("0x1f4", "0x64", "C:\\Temp\\child.exe"))
            .unwrap();
        let parent = nodes[2].as_process().unwrap();

        assert_eq!(parent.process_image.as_deref(), Some("explorer.exe"));
        assert_eq!(parent.process_id, Some(0x64));
        assert!(parent.launched.contains(&nodes[0].key()));
    }

    #[test]
    fn lookup_snapshot_has_no_edges() {
        let transformer = EvtxTransformer::new();
        transformer
            .transform(&creation_event("0x64", "0x4", "C:\\Windows\\explorer.exe"))
            .unwrap();
        let seen = transformer.seen.lock().unwrap();
        assert!(seen.get(&0x64).unwrap().launched.is_empty());
    }

    #[test]
    fn decimal_pid_is_accepted() {
        let transformer = EvtxTransformer::new();
        let nodes = transformer
            .transform(&creation_event("500", "100", "C:\\Temp\\a.exe"))
            .unwrap();
        assert_eq!(nodes[0].as_process().unwrap().process_id, Some(500));
    }

    #[test]
    fn invalid_pid_errors() {
        let transformer = EvtxTransformer::new();
        let event = creation_event("zzz", "0x64", "C:\\Temp\\a.exe");
        assert!(transformer.transform(&event).is_err());
    }

    #[test]
    fn with_seen_preloads_lookup() {
        let mut seen = HashMap::new();
        seen.insert(
            0x64,
            Process {
                host: Some("ws-01".to_owned()),
                process_id: Some(0x64),
                process_image: Some("services.exe".to_owned()),
                ..Default::default()
            },
        );
        let transformer = EvtxTransformer::with_seen(seen);
        let nodes = transformer
            .transform(&creation_event("0x1f4", "0x64", "C:\\Temp\\child.exe"))
            .unwrap();
        let parent = nodes[2].as_process().unwrap();
        assert_eq!(parent.process_image.as_deref(), Some("services.exe"));
    }
}

//! 정규화 스키마 transformer
//!
//! 사전 정의된 스키마(필드명/이벤트 타입 상수)로 데이터를 내보내는
//! 모든 소스에 사용할 수 있는 transformer입니다. 프로세스 생성, 파일
//! 조작, 네트워크 연결, DNS/HTTP, 레지스트리 조작, 알림 래핑을
//! 처리합니다.

use casegraph_core::edge::EdgeOccurrence;
use casegraph_core::error::TransformError;
use casegraph_core::event::{Event, event_types, fields};
use casegraph_core::node::{
    Alert, Domain, File, GraphNode, IpAddress, Node, Process, RegistryKey, Uri,
};
use casegraph_core::pipeline::Transform;

use crate::transform::hash_map_field;

/// 정규화 스키마 transformer
#[derive(Debug, Default)]
pub struct GenericTransformer;

impl GenericTransformer {
    /// 새 transformer를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 이벤트의 행위 주체 프로세스와 그 이미지 File 노드를 만듭니다.
    ///
    /// File - (file_of) -> Process 관계가 미리 연결됩니다.
    fn subject_process(&self, event: &Event) -> Result<(Process, File), TransformError> {
        let process = Process {
            process_image: Some(event.require_string(fields::PROCESS_IMAGE)?),
            process_image_path: Some(event.require_string(fields::PROCESS_IMAGE_PATH)?),
            process_id: Some(event.require_i64(fields::PROCESS_ID)?),
            command_line: Some(event.require_string(fields::COMMAND_LINE)?),
            ..Default::default()
        };
        let mut proc_file = process.file_node();
        proc_file.file_of.touch(process.key());
        Ok((process, proc_file))
    }

    /// 알림 래퍼 이벤트를 처리합니다.
    ///
    /// 알림 필드를 떼어낸 내부 이벤트를 재귀 변환하고, 결과 노드
    /// 전부에 alerted_on 엣지를 단 Alert 노드를 맨 앞에 붙입니다.
    /// 내부 이벤트가 노드를 만들지 못하면 Alert 하나만 반환합니다.
    fn make_alert(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let mut inner = event.clone();
        inner.remove(fields::ALERTED_ON);

        let name = inner
            .remove(fields::ALERT_NAME)
            .and_then(|v| v.as_str().map(ToOwned::to_owned))
            .ok_or_else(|| TransformError::missing(fields::ALERT_NAME))?;
        let data = inner
            .remove(fields::ALERT_DATA)
            .and_then(|v| v.as_str().map(ToOwned::to_owned));

        let mut alert = Alert::new(name);
        alert.data = data;

        let nodes = self.transform(&inner)?;
        if nodes.is_empty() {
            return Ok(vec![alert.into()]);
        }

        let timestamp = event.get_timestamp(fields::TIMESTAMP);
        for node in &nodes {
            match timestamp {
                Some(ts) => alert.alerted_on.append(node.key(), EdgeOccurrence::at(ts)),
                None => alert.alerted_on.touch(node.key()),
            }
        }

        let mut out = Vec::with_capacity(nodes.len() + 1);
        out.push(alert.into());
        out.extend(nodes);
        Ok(out)
    }

    /// 프로세스 생성 이벤트: 부모/자식 프로세스와 각각의 이미지 파일.
    fn make_process(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let mut parent = Process {
            process_image: Some(event.require_string(fields::PARENT_PROCESS_IMAGE)?),
            process_image_path: Some(event.require_string(fields::PARENT_PROCESS_IMAGE_PATH)?),
            process_id: Some(event.require_i64(fields::PARENT_PROCESS_ID)?),
            command_line: Some(event.require_string(fields::PARENT_COMMAND_LINE)?),
            ..Default::default()
        };
        let mut parent_file = parent.file_node();
        parent_file.file_of.touch(parent.key());

        let child = Process {
            process_image: Some(event.require_string(fields::PROCESS_IMAGE)?),
            process_image_path: Some(event.require_string(fields::PROCESS_IMAGE_PATH)?),
            process_id: Some(event.require_i64(fields::PROCESS_ID)?),
            command_line: Some(event.require_string(fields::COMMAND_LINE)?),
            ..Default::default()
        };
        let mut child_file = child.file_node();
        child_file.file_of.touch(child.key());

        match event.get_timestamp(fields::TIMESTAMP) {
            Some(ts) => parent.launched.append(child.key(), EdgeOccurrence::at(ts)),
            None => parent.launched.touch(child.key()),
        }

        Ok(vec![
            parent.into(),
            parent_file.into(),
            child.into(),
            child_file.into(),
        ])
    }

    /// 파일 열람/쓰기/삭제/모듈 로드 이벤트.
    fn make_basic_file(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;

        let mut file_node = File {
            file_path: Some(event.require_string(fields::FILE_PATH)?),
            file_name: Some(event.require_string(fields::FILE_NAME)?),
            hashes: hash_map_field(event, fields::HASHES),
            ..Default::default()
        };
        file_node.set_extension();

        let event_type = event.require_str(fields::EVENT_TYPE)?;
        match event_type {
            event_types::FILE_OPENED => process.accessed.touch(file_node.key()),
            event_types::FILE_WRITTEN => process.wrote.touch(file_node.key()),
            event_types::LOADED_MODULE => process.loaded.touch(file_node.key()),
            _ => process.deleted.touch(file_node.key()),
        }

        Ok(vec![process.into(), proc_file.into(), file_node.into()])
    }

    /// 파일 복사 이벤트: 원본/대상 파일과 copied/copied_to 엣지.
    fn make_file_copy(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;

        let src = Event::from_map(event.require_map(fields::SRC_FILE)?.clone());
        let mut src_file = File {
            file_path: Some(src.require_string(fields::FILE_PATH)?),
            file_name: Some(src.require_string(fields::FILE_NAME)?),
            hashes: hash_map_field(&src, fields::HASHES),
            ..Default::default()
        };
        src_file.set_extension();

        let dest = Event::from_map(event.require_map(fields::DEST_FILE)?.clone());
        let mut dest_file = File {
            file_path: Some(dest.require_string(fields::FILE_PATH)?),
            file_name: Some(dest.require_string(fields::FILE_NAME)?),
            hashes: hash_map_field(&dest, fields::HASHES),
            ..Default::default()
        };
        dest_file.set_extension();

        src_file.copied_to.touch(dest_file.key());
        process.copied.touch(src_file.key());

        Ok(vec![
            process.into(),
            proc_file.into(),
            src_file.into(),
            dest_file.into(),
        ])
    }

    /// 네트워크 연결 이벤트. 포트/프로토콜은 있는 만큼만 기록합니다.
    fn make_connection(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;
        let addr = IpAddress::new(event.require_string(fields::IP_ADDRESS)?);

        let mut occurrence = EdgeOccurrence::new();
        let mut has_metadata = false;
        if let Some(port) = event.get_i64(fields::PORT) {
            let port = u16::try_from(port)
                .map_err(|_| TransformError::invalid(fields::PORT, "port out of range"))?;
            occurrence = occurrence.port(port);
            has_metadata = true;
        }
        if let Some(protocol) = event.get_string(fields::PROTOCOL) {
            occurrence = occurrence.protocol(protocol);
            has_metadata = true;
        }

        if has_metadata {
            process.connected_to.append(addr.key(), occurrence);
        } else {
            process.connected_to.touch(addr.key());
        }

        Ok(vec![process.into(), proc_file.into(), addr.into()])
    }

    /// HTTP 요청 이벤트. 해석된 IP가 있으면 함께 반환합니다.
    fn make_http_request(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;

        let mut domain = Domain::new(event.require_string(fields::HTTP_HOST)?);
        let mut uri = Uri::new(event.require_string(fields::URI)?);
        uri.uri_of.touch(domain.key());

        process.http_request_to.append(
            uri.key(),
            EdgeOccurrence::new().method(event.require_string(fields::HTTP_METHOD)?),
        );

        if let Some(ip) = event.get_string(fields::IP_ADDRESS) {
            let addr = IpAddress::new(ip);
            domain.resolves_to.touch(addr.key());
            process.connected_to.touch(addr.key());
            Ok(vec![
                process.into(),
                proc_file.into(),
                uri.into(),
                domain.into(),
                addr.into(),
            ])
        } else {
            Ok(vec![
                process.into(),
                proc_file.into(),
                uri.into(),
                domain.into(),
            ])
        }
    }

    /// DNS 조회 이벤트. 해석 결과를 모르는 경우도 유효합니다.
    fn make_dns_lookup(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;

        let mut domain = Domain::new(event.require_string(fields::HTTP_HOST)?);
        process.dns_query_for.touch(domain.key());

        if let Some(ip) = event.get_string(fields::IP_ADDRESS) {
            let addr = IpAddress::new(ip);
            domain.resolves_to.touch(addr.key());
            Ok(vec![
                process.into(),
                proc_file.into(),
                domain.into(),
                addr.into(),
            ])
        } else {
            Ok(vec![process.into(), proc_file.into(), domain.into()])
        }
    }

    /// 레지스트리 키 열람/삭제 이벤트.
    fn make_basic_regkey(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;

        let reg_node = RegistryKey {
            hive: Some(event.require_string(fields::HIVE)?),
            key_path: Some(event.require_string(fields::REG_KEY_PATH)?),
            key: Some(event.require_string(fields::REG_KEY)?),
            ..Default::default()
        };

        if event.require_str(fields::EVENT_TYPE)? == event_types::REG_KEY_OPENED {
            process.read_key.touch(reg_node.key());
        } else {
            process.deleted_key.touch(reg_node.key());
        }

        Ok(vec![process.into(), proc_file.into(), reg_node.into()])
    }

    /// 레지스트리 값 설정 이벤트. 값이 없으면 키만 기록합니다.
    fn make_regkey_set_value(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;

        let reg_node = RegistryKey {
            hive: Some(event.require_string(fields::HIVE)?),
            key_path: Some(event.require_string(fields::REG_KEY_PATH)?),
            key: Some(event.require_string(fields::REG_KEY)?),
            value: event.get_string(fields::REG_KEY_VALUE),
            ..Default::default()
        };

        match &reg_node.value {
            Some(value) => process
                .changed_value
                .append(reg_node.key(), EdgeOccurrence::new().value(value.clone())),
            None => process.changed_value.touch(reg_node.key()),
        }

        Ok(vec![process.into(), proc_file.into(), reg_node.into()])
    }
}

impl Transform for GenericTransformer {
    fn name(&self) -> &str {
        "generic"
    }

    fn transform(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        if event.get_bool(fields::ALERTED_ON).unwrap_or(false) {
            return self.make_alert(event);
        }

        let Some(event_type) = event.get_str(fields::EVENT_TYPE) else {
            return Ok(Vec::new());
        };

        match event_type {
            event_types::PROCESS_LAUNCHED => self.make_process(event),
            event_types::FILE_DELETED
            | event_types::FILE_OPENED
            | event_types::FILE_WRITTEN
            | event_types::LOADED_MODULE => self.make_basic_file(event),
            event_types::FILE_COPIED => self.make_file_copy(event),
            event_types::CONNECTION => self.make_connection(event),
            event_types::HTTP_REQUEST => self.make_http_request(event),
            event_types::DNS_LOOKUP => self.make_dns_lookup(event),
            event_types::REG_KEY_OPENED | event_types::REG_KEY_DELETED => {
                self.make_basic_regkey(event)
            }
            event_types::REG_KEY_SET => self.make_regkey_set_value(event),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transformer() -> GenericTransformer {
        GenericTransformer::new()
    }

    fn launch_event() -> Event {
        Event::new()
            .with(fields::PARENT_PROCESS_IMAGE, "cmd.exe")
            .with(fields::PARENT_PROCESS_IMAGE_PATH, "C:\\Windows\\")
            .with(fields::PARENT_PROCESS_ID, "100")
            .with(fields::PARENT_COMMAND_LINE, "cmd")
            .with(fields::PROCESS_IMAGE, "child.exe")
            .with(fields::PROCESS_IMAGE_PATH, "C:\\Temp\\")
            .with(fields::PROCESS_ID, "200")
            .with(fields::COMMAND_LINE, "child.exe -x")
            .with(fields::EVENT_TYPE, event_types::PROCESS_LAUNCHED)
            .with(fields::TIMESTAMP, 1000)
    }

    fn subject_fields(event: Event) -> Event {
        event
            .with(fields::PROCESS_IMAGE, "proc.exe")
            .with(fields::PROCESS_IMAGE_PATH, "C:\\Windows\\")
            .with(fields::PROCESS_ID, "3144")
            .with(fields::COMMAND_LINE, "proc.exe -run")
    }

    #[test]
    fn unrecognized_event_type_is_noop() {
        let event = Event::new().with(fields::EVENT_TYPE, "something_unknown");
        assert!(transformer().transform(&event).unwrap().is_empty());
    }

    #[test]
    fn missing_event_type_is_noop() {
        assert!(transformer().transform(&Event::new()).unwrap().is_empty());
    }

    #[test]
    fn process_launch_yields_four_nodes() {
        let nodes = transformer().transform(&launch_event()).unwrap();
        assert_eq!(nodes.len(), 4);

        let parent = nodes[0].as_process().unwrap();
        let parent_file = nodes[1].as_file().unwrap();
        let child = nodes[2].as_process().unwrap();
        let child_file = nodes[3].as_file().unwrap();

        assert_eq!(parent.process_id, Some(100));
        assert_eq!(child.process_id, Some(200));
        assert_eq!(parent_file.file_name.as_deref(), Some("cmd.exe"));
        assert_eq!(child_file.file_name.as_deref(), Some("child.exe"));

        // launched 엣지: parent -> child, timestamp=1000
        let occs = parent.launched.occurrences(&child.key()).unwrap();
        assert_eq!(occs.len(), 1);
        assert_eq!(occs[0].timestamp, Some(1000));

        // file_of 엣지 2개
        assert!(parent_file.file_of.contains(&parent.key()));
        assert!(child_file.file_of.contains(&child.key()));
    }

    #[test]
    fn process_launch_without_timestamp_registers_edge() {
        let mut event = launch_event();
        event.remove(fields::TIMESTAMP);
        let nodes = transformer().transform(&event).unwrap();
        let parent = nodes[0].as_process().unwrap();
        let child = nodes[2].as_process().unwrap();
        assert!(parent.launched.contains(&child.key()));
        assert_eq!(parent.launched.occurrences(&child.key()).unwrap().len(), 0);
    }

    #[test]
    fn process_launch_missing_field_errors() {
        let mut event = launch_event();
        event.remove(fields::PARENT_PROCESS_ID);
        let err = transformer().transform(&event).unwrap_err();
        assert!(matches!(err, TransformError::MissingField { .. }));
    }

    #[test]
    fn alert_wraps_process_launch() {
        let event = launch_event()
            .with(fields::ALERTED_ON, true)
            .with(fields::ALERT_NAME, "X");
        let nodes = transformer().transform(&event).unwrap();

        assert_eq!(nodes.len(), 5);
        let alert = nodes[0].as_alert().unwrap();
        assert_eq!(alert.name, "X");
        assert_eq!(alert.alerted_on.len(), 4);
        for node in &nodes[1..] {
            let occs = alert.alerted_on.occurrences(&node.key()).unwrap();
            assert_eq!(occs[0].timestamp, Some(1000));
        }
    }

    #[test]
    fn alert_with_empty_inner_event_yields_alert_only() {
        let event = Event::new()
            .with(fields::ALERTED_ON, true)
            .with(fields::ALERT_NAME, "X")
            .with(fields::EVENT_TYPE, "unknown_type");
        let nodes = transformer().transform(&event).unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].as_alert().is_some());
    }

    #[test]
    fn alert_without_name_errors() {
        let event = launch_event().with(fields::ALERTED_ON, true);
        assert!(transformer().transform(&event).is_err());
    }

    #[test]
    fn file_written_creates_wrote_edge() {
        let event = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::FILE_WRITTEN)
            .with(fields::FILE_PATH, "C:\\Temp")
            .with(fields::FILE_NAME, "dropper.exe")
            .with(fields::HASHES, json!({"md5": "abcd1234"}));
        let nodes = transformer().transform(&event).unwrap();
        assert_eq!(nodes.len(), 3);

        let process = nodes[0].as_process().unwrap();
        let file = nodes[2].as_file().unwrap();
        assert!(process.wrote.contains(&file.key()));
        assert_eq!(file.extension.as_deref(), Some("exe"));
        assert_eq!(file.hashes.get("md5").map(String::as_str), Some("abcd1234"));
    }

    #[test]
    fn file_opened_creates_accessed_edge() {
        let event = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::FILE_OPENED)
            .with(fields::FILE_PATH, "C:\\Temp")
            .with(fields::FILE_NAME, "doc.pdf");
        let nodes = transformer().transform(&event).unwrap();
        let process = nodes[0].as_process().unwrap();
        let file = nodes[2].as_file().unwrap();
        assert!(process.accessed.contains(&file.key()));
    }

    #[test]
    fn loaded_module_creates_loaded_edge() {
        let event = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::LOADED_MODULE)
            .with(fields::FILE_PATH, "C:\\Windows\\System32")
            .with(fields::FILE_NAME, "evil.dll");
        let nodes = transformer().transform(&event).unwrap();
        let process = nodes[0].as_process().unwrap();
        assert!(process.loaded.contains(&nodes[2].key()));
    }

    #[test]
    fn file_deleted_creates_deleted_edge() {
        let event = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::FILE_DELETED)
            .with(fields::FILE_PATH, "C:\\Temp")
            .with(fields::FILE_NAME, "trace.log");
        let nodes = transformer().transform(&event).unwrap();
        let process = nodes[0].as_process().unwrap();
        assert!(process.deleted.contains(&nodes[2].key()));
    }

    #[test]
    fn file_copy_yields_src_and_dest() {
        let event = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::FILE_COPIED)
            .with(
                fields::SRC_FILE,
                json!({fields::FILE_PATH: "C:\\Users\\a", fields::FILE_NAME: "orig.doc"}),
            )
            .with(
                fields::DEST_FILE,
                json!({fields::FILE_PATH: "C:\\Temp", fields::FILE_NAME: "copy.doc"}),
            );
        let nodes = transformer().transform(&event).unwrap();
        assert_eq!(nodes.len(), 4);

        let process = nodes[0].as_process().unwrap();
        let src = nodes[2].as_file().unwrap();
        let dest = nodes[3].as_file().unwrap();
        assert!(src.copied_to.contains(&dest.key()));
        assert!(process.copied.contains(&src.key()));
    }

    #[test]
    fn connection_with_port_and_protocol() {
        let event = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::CONNECTION)
            .with(fields::IP_ADDRESS, "10.0.0.5")
            .with(fields::PORT, "443")
            .with(fields::PROTOCOL, "tcp");
        let nodes = transformer().transform(&event).unwrap();
        assert_eq!(nodes.len(), 3);

        let process = nodes[0].as_process().unwrap();
        let addr = nodes[2].as_ip_address().unwrap();
        let occs = process.connected_to.occurrences(&addr.key()).unwrap();
        assert_eq!(occs[0].port, Some(443));
        assert_eq!(occs[0].protocol.as_deref(), Some("tcp"));
    }

    #[test]
    fn connection_without_metadata_registers_edge() {
        let event = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::CONNECTION)
            .with(fields::IP_ADDRESS, "10.0.0.5");
        let nodes = transformer().transform(&event).unwrap();
        let process = nodes[0].as_process().unwrap();
        let addr_key = nodes[2].key();
        assert!(process.connected_to.contains(&addr_key));
        assert_eq!(process.connected_to.occurrences(&addr_key).unwrap().len(), 0);
    }

    #[test]
    fn connection_with_port_only() {
        let event = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::CONNECTION)
            .with(fields::IP_ADDRESS, "10.0.0.5")
            .with(fields::PORT, 8080);
        let nodes = transformer().transform(&event).unwrap();
        let process = nodes[0].as_process().unwrap();
        let occs = process.connected_to.occurrences(&nodes[2].key()).unwrap();
        assert_eq!(occs[0].port, Some(8080));
        assert_eq!(occs[0].protocol, None);
    }

    #[test]
    fn http_request_without_ip_yields_four_nodes() {
        let event = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::HTTP_REQUEST)
            .with(fields::HTTP_HOST, "evil.test")
            .with(fields::URI, "/payload")
            .with(fields::HTTP_METHOD, "GET");
        let nodes = transformer().transform(&event).unwrap();
        assert_eq!(nodes.len(), 4);

        let process = nodes[0].as_process().unwrap();
        let uri = nodes[2].as_uri().unwrap();
        let domain = nodes[3].as_domain().unwrap();
        assert!(uri.uri_of.contains(&domain.key()));
        let occs = process.http_request_to.occurrences(&uri.key()).unwrap();
        assert_eq!(occs[0].method.as_deref(), Some("GET"));
    }

    #[test]
    fn http_request_with_ip_yields_five_nodes() {
        let event = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::HTTP_REQUEST)
            .with(fields::HTTP_HOST, "evil.test")
            .with(fields::URI, "/payload")
            .with(fields::HTTP_METHOD, "POST")
            .with(fields::IP_ADDRESS, "203.0.113.9");
        let nodes = transformer().transform(&event).unwrap();
        assert_eq!(nodes.len(), 5);

        let process = nodes[0].as_process().unwrap();
        let domain = nodes[3].as_domain().unwrap();
        let addr = nodes[4].as_ip_address().unwrap();
        assert!(domain.resolves_to.contains(&addr.key()));
        assert!(process.connected_to.contains(&addr.key()));
    }

    #[test]
    fn dns_lookup_with_and_without_resolution() {
        let base = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::DNS_LOOKUP)
            .with(fields::HTTP_HOST, "evil.test");

        let nodes = transformer().transform(&base).unwrap();
        assert_eq!(nodes.len(), 3);
        let process = nodes[0].as_process().unwrap();
        assert!(process.dns_query_for.contains(&nodes[2].key()));

        let resolved = base.with(fields::IP_ADDRESS, "203.0.113.9");
        let nodes = transformer().transform(&resolved).unwrap();
        assert_eq!(nodes.len(), 4);
        let domain = nodes[2].as_domain().unwrap();
        assert!(domain.resolves_to.contains(&nodes[3].key()));
    }

    #[test]
    fn regkey_opened_creates_read_key_edge() {
        let event = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::REG_KEY_OPENED)
            .with(fields::HIVE, "HKEY_LOCAL_MACHINE")
            .with(fields::REG_KEY_PATH, "SOFTWARE\\Microsoft")
            .with(fields::REG_KEY, "Run");
        let nodes = transformer().transform(&event).unwrap();
        assert_eq!(nodes.len(), 3);
        let process = nodes[0].as_process().unwrap();
        assert!(process.read_key.contains(&nodes[2].key()));
    }

    #[test]
    fn regkey_deleted_creates_deleted_key_edge() {
        let event = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::REG_KEY_DELETED)
            .with(fields::HIVE, "HKEY_LOCAL_MACHINE")
            .with(fields::REG_KEY_PATH, "SOFTWARE\\Microsoft")
            .with(fields::REG_KEY, "Run");
        let nodes = transformer().transform(&event).unwrap();
        let process = nodes[0].as_process().unwrap();
        assert!(process.deleted_key.contains(&nodes[2].key()));
    }

    #[test]
    fn regkey_set_with_value_records_occurrence() {
        let event = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::REG_KEY_SET)
            .with(fields::HIVE, "HKEY_LOCAL_MACHINE")
            .with(fields::REG_KEY_PATH, "SOFTWARE\\Microsoft")
            .with(fields::REG_KEY, "Run")
            .with(fields::REG_KEY_VALUE, "C:\\evil.exe");
        let nodes = transformer().transform(&event).unwrap();
        let process = nodes[0].as_process().unwrap();
        let reg = nodes[2].as_registry_key().unwrap();
        assert_eq!(reg.value.as_deref(), Some("C:\\evil.exe"));
        let occs = process.changed_value.occurrences(&reg.key()).unwrap();
        assert_eq!(occs[0].value.as_deref(), Some("C:\\evil.exe"));
    }

    #[test]
    fn regkey_set_without_value_registers_edge_only() {
        let event = subject_fields(Event::new())
            .with(fields::EVENT_TYPE, event_types::REG_KEY_SET)
            .with(fields::HIVE, "HKEY_LOCAL_MACHINE")
            .with(fields::REG_KEY_PATH, "SOFTWARE\\Microsoft")
            .with(fields::REG_KEY, "Run");
        let nodes = transformer().transform(&event).unwrap();
        let process = nodes[0].as_process().unwrap();
        let reg_key = nodes[2].key();
        assert!(process.changed_value.contains(&reg_key));
        assert_eq!(process.changed_value.occurrences(&reg_key).unwrap().len(), 0);
    }
}

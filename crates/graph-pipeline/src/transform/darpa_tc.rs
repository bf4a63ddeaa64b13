//! DARPA Transparent Computing transformer
//!
//! TC CDM 레코드를 노드로 변환합니다. TC는 모든 객체에 고유 UUID를
//! 부여하므로, 업무 키 대신 UUID를 유일한 식별자로 사용합니다
//! (노드의 `guid` 필드). 이벤트 레코드는 subject/predicate UUID만
//! 참조하므로 속성 없는 노드가 만들어지고, 그래프 조립 시 같은
//! UUID의 객체 레코드와 병합됩니다.

use casegraph_core::edge::EdgeOccurrence;
use casegraph_core::error::TransformError;
use casegraph_core::event::Event;
use casegraph_core::node::{File, GraphNode, IpAddress, Node, Process, RegistryKey};
use casegraph_core::path::{split_path, split_reg_path};
use casegraph_core::pipeline::Transform;

/// CDM 스키마의 UUID 래퍼 키
const CDM_UUID: &str = "com.bbn.tc.schema.avro.cdm18.UUID";
/// CDM 스키마의 Value 래퍼 키
const CDM_VALUE: &str = "com.bbn.tc.schema.avro.cdm18.Value";

/// DARPA TC transformer
#[derive(Debug, Default)]
pub struct DarpaTcTransformer;

impl DarpaTcTransformer {
    /// 새 transformer를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// subject/SUBJECT_PROCESS: 프로세스 객체 레코드.
    fn make_process(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let command_line = event
            .get_map("cmdLine")
            .and_then(|m| m.get("string"))
            .and_then(|v| v.as_str())
            .map(ToOwned::to_owned);

        // 전체 경로는 properties.map.path에 있을 때만 존재하며,
        // 시스템에 따라 슬래시 방향이 섞여 들어옵니다.
        let split = event
            .get_map("properties")
            .and_then(|m| m.get("map"))
            .and_then(|v| v.as_object())
            .and_then(|map| map.get("path"))
            .and_then(|v| v.as_str())
            .map(|path| split_path(&path.replace('/', "\\")));
        let (image, image_path) = match split {
            Some((image, path)) => (Some(image), Some(path)),
            None => (None, None),
        };

        let host = event.get_string("hostId");
        let process = Process {
            guid: Some(event.require_string("uuid")?),
            host: host.clone(),
            process_image: image.or_else(|| command_line.clone()),
            process_image_path: image_path.or_else(|| command_line.clone()),
            command_line,
            ..Default::default()
        };

        let Some(parent_subject) = event.get_map("parentSubject") else {
            return Ok(vec![process.into()]);
        };

        let parent_uuid = parent_subject
            .get(CDM_UUID)
            .and_then(|v| v.as_str())
            .ok_or_else(|| TransformError::missing("parentSubject"))?;
        let mut parent = Process {
            guid: Some(parent_uuid.to_owned()),
            host,
            ..Default::default()
        };

        parent.launched.touch(process.key());

        Ok(vec![process.into(), parent.into()])
    }

    /// fileobject: 파일 객체 레코드.
    fn make_file(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let base = Event::from_map(event.require_map("baseObject")?.clone());

        let mut file_node = File {
            guid: Some(event.require_string("uuid")?),
            host: base.get_string("hostId"),
            ..Default::default()
        };

        // 모든 시스템이 전체 경로를 보고하지는 않습니다.
        if let Some(filename) = base
            .get_map("properties")
            .and_then(|m| m.get("map"))
            .and_then(|v| v.as_object())
            .and_then(|map| map.get("filename"))
            .and_then(|v| v.as_str())
        {
            let normalized = filename.replace('/', "\\");
            let (file_name, file_path) = split_path(&normalized);
            file_node.full_path = Some(normalized);
            file_node.file_name = Some(file_name);
            file_node.file_path = Some(file_path);
        }

        Ok(vec![file_node.into()])
    }

    /// registrykeyobject: 레지스트리 키 객체 레코드.
    fn make_registry_key(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (hive, key, key_path) = split_reg_path(event.require_str("key")?);
        let base = Event::from_map(event.require_map("baseObject")?.clone());

        let value = event
            .require_map("value")?
            .get(CDM_VALUE)
            .and_then(|v| v.as_object())
            .ok_or_else(|| TransformError::invalid("value", "expected CDM value object"))?;

        let reg_node = RegistryKey {
            guid: Some(event.require_string("uuid")?),
            host: base.get_string("hostId"),
            hive: Some(hive),
            key: Some(key),
            key_path: Some(key_path),
            value: value.get("name").and_then(|v| v.as_str()).map(ToOwned::to_owned),
            value_type: value
                .get("valueDataType")
                .and_then(|v| v.as_str())
                .map(ToOwned::to_owned),
            ..Default::default()
        };

        Ok(vec![reg_node.into()])
    }

    /// netflowobject: 원격 주소 객체 레코드.
    fn make_addr(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let addr = IpAddress {
            guid: Some(event.require_string("uuid")?),
            ip_address: event.get_string("remoteAddress"),
            ..Default::default()
        };
        Ok(vec![addr.into()])
    }

    /// subject UUID만 가진 프로세스 참조 노드를 만듭니다.
    fn subject_ref(&self, event: &Event) -> Result<Process, TransformError> {
        let uuid = event
            .require_map("subject")?
            .get(CDM_UUID)
            .and_then(|v| v.as_str())
            .ok_or_else(|| TransformError::missing("subject"))?;
        Ok(Process {
            guid: Some(uuid.to_owned()),
            ..Default::default()
        })
    }

    /// predicateObject UUID를 꺼냅니다.
    fn predicate_uuid(&self, event: &Event) -> Result<String, TransformError> {
        event
            .require_map("predicateObject")?
            .get(CDM_UUID)
            .and_then(|v| v.as_str())
            .map(ToOwned::to_owned)
            .ok_or_else(|| TransformError::missing("predicateObject"))
    }

    /// event/파일 연산: 프로세스→파일 참조 엣지.
    fn file_events(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let mut process = self.subject_ref(event)?;
        let target = File {
            guid: Some(self.predicate_uuid(event)?),
            ..Default::default()
        };

        let occurrence =
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("timestampNanos"));
        match event.require_str("type")? {
            "EVENT_READ" | "EVENT_OPEN" | "EVENT_MODIFY_FILE_ATTRIBUTES" => {
                process.accessed.append(target.key(), occurrence);
            }
            "EVENT_WRITE" | "EVENT_WRITE_APPEND" | "EVENT_CREATE_OBJECT" => {
                process.wrote.append(target.key(), occurrence);
            }
            _ => {
                process.loaded.append(target.key(), occurrence);
            }
        }

        Ok(vec![process.into(), target.into()])
    }

    /// event/EVENT_EXECUTE: 프로세스 실행 엣지.
    fn execute_events(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let mut process = self.subject_ref(event)?;
        let target = Process {
            guid: Some(self.predicate_uuid(event)?),
            process_image: event
                .get_map("predicateObjectPath")
                .and_then(|m| m.get("string"))
                .and_then(|v| v.as_str())
                .map(ToOwned::to_owned),
            ..Default::default()
        };

        process.launched.append(
            target.key(),
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("timestampNanos")),
        );

        Ok(vec![process.into(), target.into()])
    }

    /// event/EVENT_CONNECT: 네트워크 연결 엣지.
    fn conn_events(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let mut process = self.subject_ref(event)?;
        let addr = IpAddress {
            guid: Some(self.predicate_uuid(event)?),
            ..Default::default()
        };

        process.connected_to.append(
            addr.key(),
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("timestampNanos")),
        );

        Ok(vec![process.into(), addr.into()])
    }
}

impl Transform for DarpaTcTransformer {
    fn name(&self) -> &str {
        "darpa_tc"
    }

    fn transform(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let Some(event_type) = event.get_str("event_type") else {
            return Ok(Vec::new());
        };
        let record_type = event.get_str("type").unwrap_or_default();

        match event_type {
            "subject" if record_type == "SUBJECT_PROCESS" => self.make_process(event),
            "fileobject"
                if record_type == "FILE_OBJECT_BLOCK" || record_type == "FILE_OBJECT_PEFILE" =>
            {
                self.make_file(event)
            }
            "registrykeyobject" => self.make_registry_key(event),
            "netflowobject" => self.make_addr(event),
            "event" => match record_type {
                "EVENT_READ" | "EVENT_OPEN" | "EVENT_WRITE" | "EVENT_WRITE_APPEND"
                | "EVENT_MODIFY_FILE_ATTRIBUTES" | "EVENT_CREATE_OBJECT"
                | "EVENT_LOAD_LIBRARY" => self.file_events(event),
                "EVENT_EXECUTE" => self.execute_events(event),
                "EVENT_CONNECT" => self.conn_events(event),
                _ => Ok(Vec::new()),
            },
            _ => Ok(Vec::new()),
        }
    }
}

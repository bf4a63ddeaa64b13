//! FireEye HX Triage transformer
//!
//! HX 에이전트 이벤트(event_type 판별)를 노드로 변환합니다. Triage가
//! 알림을 래퍼 이벤트(alertEvent)로 내보내므로, 래핑된 에이전트
//! 이벤트를 재귀 변환한 뒤 Alert 노드를 붙입니다.

use casegraph_core::edge::EdgeOccurrence;
use casegraph_core::error::TransformError;
use casegraph_core::event::{Event, protocols};
use casegraph_core::node::{Alert, Domain, File, GraphNode, IpAddress, Node, Process, RegistryKey, Uri};
use casegraph_core::path::split_path;
use casegraph_core::pipeline::Transform;

/// FireEye HX Triage transformer
#[derive(Debug, Default)]
pub struct FireEyeHxTransformer;

impl FireEyeHxTransformer {
    /// 새 transformer를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 행위 주체 프로세스. HX는 이미지명과 경로를 별도 필드로 보고합니다.
    fn subject_process(&self, event: &Event) -> Result<(Process, File), TransformError> {
        let process = Process {
            process_id: Some(event.require_i64("pid")?),
            process_image: Some(event.require_string("process")?),
            process_image_path: Some(event.require_string("processPath")?),
            command_line: event.get_string("processCmdLine"),
            user: event.get_string("username"),
            ..Default::default()
        };
        let mut proc_file = process.file_node();
        proc_file.file_of.touch(process.key());
        Ok((process, proc_file))
    }

    /// drive 필드가 있으면 경로 앞에 드라이브를 붙입니다.
    fn file_path_with_drive(&self, event: &Event) -> Result<String, TransformError> {
        let file_path = event.require_string("filePath")?;
        match event.get_string("drive") {
            Some(drive) if !drive.is_empty() => Ok(format!("{drive}:\\{file_path}")),
            _ => Ok(file_path),
        }
    }

    /// processEvent: 프로세스 시작. 부모 정보가 없으면 자식만 반환합니다.
    fn make_process(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        // start/running 외의 상태 변화는 그래프에 기여하지 않습니다.
        let event_type = event.require_str("eventType")?;
        if event_type != "start" && event_type != "running" {
            return Ok(Vec::new());
        }

        // running 상태의 일부 레코드는 경로를 제대로 보고하지 못해
        // processPath == process가 됩니다. 의미 없는 데이터이므로 버립니다.
        if event.require_str("processPath")? == event.require_str("process")? {
            return Ok(Vec::new());
        }

        let (image, image_path) = split_path(event.require_str("processPath")?);

        let mut hashes = std::collections::HashMap::new();
        if let Some(md5) = event.get_string("md5")
            && !md5.is_empty()
        {
            hashes.insert("md5".to_owned(), md5);
        }

        let child = Process {
            process_id: Some(event.require_i64("pid")?),
            process_image: Some(image),
            process_image_path: Some(image_path),
            command_line: event.get_string("processCmdLine"),
            user: event.get_string("username"),
            hashes,
            ..Default::default()
        };
        let mut child_file = child.file_node();
        child_file.file_of.touch(child.key());

        let Some(parent_path) = event.get_str("parentProcessPath") else {
            return Ok(vec![child.into(), child_file.into()]);
        };

        let (parent_image, parent_image_path) = split_path(parent_path);
        let mut parent = Process {
            process_id: Some(event.require_i64("parentPid")?),
            process_image: Some(parent_image),
            process_image_path: Some(parent_image_path),
            ..Default::default()
        };
        let mut parent_file = parent.file_node();
        parent_file.file_of.touch(parent.key());

        parent.launched.append(
            child.key(),
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("event_time")),
        );

        Ok(vec![
            parent.into(),
            parent_file.into(),
            child.into(),
            child_file.into(),
        ])
    }

    /// fileWriteEvent: 파일 쓰기. 쓴 내용 일부가 엣지에 기록됩니다.
    fn make_file(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        if !event.contains("filePath") {
            return Ok(Vec::new());
        }

        let mut hashes = std::collections::HashMap::new();
        if let Some(md5) = event.get_string("md5")
            && !md5.is_empty()
        {
            hashes.insert("md5".to_owned(), md5);
        }

        let mut file_node = File {
            file_path: Some(self.file_path_with_drive(event)?),
            file_name: Some(event.require_string("fileName")?),
            hashes,
            ..Default::default()
        };
        file_node.set_extension();

        let (mut process, proc_file) = self.subject_process(event)?;

        let mut occurrence =
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("event_time"));
        if let Some(contents) = event.get_string("textAtLowestOffset") {
            occurrence = occurrence.contents(contents);
        }
        process.wrote.append(file_node.key(), occurrence);

        Ok(vec![file_node.into(), process.into(), proc_file.into()])
    }

    /// urlMonitorEvent: URI/도메인/프로세스/이미지/IP 5개 노드와
    /// uri_of, resolves_to, http_request_to, connected_to 관계.
    fn make_url(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let timestamp = event.get_timestamp("event_time");

        let mut uri = Uri::new(event.require_string("requestUrl")?);
        let mut domain = Domain::new(event.require_string("hostname")?);
        let ip_address = IpAddress::new(event.require_string("remoteIpAddress")?);

        let (mut process, proc_file) = self.subject_process(event)?;

        // URI - (uri_of) -> Domain
        uri.uri_of
            .append(domain.key(), EdgeOccurrence::new().timestamp_opt(timestamp));

        // Process - (http_request_to) -> URI
        let mut request = EdgeOccurrence::new().timestamp_opt(timestamp);
        if let Some(method) = event.get_string("urlMethod") {
            request = request.method(method);
        }
        process.http_request_to.append(uri.key(), request);

        // Process - (connected_to) -> IP
        let port = u16::try_from(event.require_i64("remotePort")?)
            .map_err(|_| TransformError::invalid("remotePort", "port out of range"))?;
        process.connected_to.append(
            ip_address.key(),
            EdgeOccurrence::new()
                .timestamp_opt(timestamp)
                .port(port)
                .protocol(protocols::HTTP),
        );

        // Domain - (resolves_to) -> IP
        domain.resolves_to.append(
            ip_address.key(),
            EdgeOccurrence::new().timestamp_opt(timestamp),
        );

        Ok(vec![
            uri.into(),
            domain.into(),
            process.into(),
            proc_file.into(),
            ip_address.into(),
        ])
    }

    /// ipv4NetworkEvent: 네트워크 연결.
    fn make_network(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;

        let ip_address = IpAddress::new(event.require_string("remoteIP")?);

        let port = u16::try_from(event.require_i64("remotePort")?)
            .map_err(|_| TransformError::invalid("remotePort", "port out of range"))?;
        process.connected_to.append(
            ip_address.key(),
            EdgeOccurrence::new()
                .timestamp_opt(event.get_timestamp("event_time"))
                .protocol(event.require_string("protocol")?)
                .port(port),
        );

        Ok(vec![ip_address.into(), process.into(), proc_file.into()])
    }

    /// dnsLookupEvent: DNS 조회.
    fn make_dnslookup(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;

        let domain = Domain::new(event.require_string("hostname")?);
        process.dns_query_for.append(
            domain.key(),
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("event_time")),
        );

        Ok(vec![domain.into(), process.into(), proc_file.into()])
    }

    /// imageLoadEvent: 모듈 로드.
    fn make_imageload(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;

        let mut loaded_file = File {
            file_path: Some(self.file_path_with_drive(event)?),
            file_name: Some(event.require_string("fileName")?),
            ..Default::default()
        };
        loaded_file.set_extension();

        process.loaded.append(
            loaded_file.key(),
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("event_time")),
        );

        Ok(vec![loaded_file.into(), process.into(), proc_file.into()])
    }

    /// regKeyEvent: 레지스트리 조작. eventType은 숫자 코드입니다.
    ///
    /// 1: 값 변경, 2: 값 삭제, 3: 키 생성, 4: 키 삭제
    fn make_registry(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;

        let reg_node = RegistryKey {
            hive: Some(event.require_string("hive")?),
            key_path: Some(event.require_string("keyPath")?),
            key: event.get_string("valueName"),
            value: event.get_string("text"),
            value_type: event.get_string("valueType"),
            ..Default::default()
        };

        let occurrence =
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("event_time"));
        match event.require_i64("eventType")? {
            1 => process.changed_value.append(reg_node.key(), occurrence),
            2 => process.deleted_value.append(reg_node.key(), occurrence),
            3 => process.created_key.append(reg_node.key(), occurrence),
            4 => process.deleted_key.append(reg_node.key(), occurrence),
            other => {
                tracing::warn!(event_type = other, "unknown hx registry event type");
            }
        }

        Ok(vec![reg_node.into(), process.into(), proc_file.into()])
    }

    /// alertEvent: 래핑된 에이전트 이벤트를 재귀 변환하고 Alert를 붙입니다.
    fn make_alert(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        // Triage에 이벤트 메타데이터가 없는 경우 match_hash로 대체합니다.
        let alert_name = match event.get_map("_threat_data") {
            Some(threat) => threat
                .get("display_name")
                .and_then(|v| v.as_str())
                .or_else(|| threat.get("uri_name").and_then(|v| v.as_str()))
                .map(ToOwned::to_owned)
                .ok_or_else(|| TransformError::missing("_threat_data.display_name"))?,
            None => event.require_string("match_hash")?,
        };

        let mut alert = Alert::new(alert_name).with_data("No data");

        // 래핑된 이벤트: data.key.event_type + data.values
        let data = event.require_map("data")?;
        let alerting_event_type = data
            .get("key")
            .and_then(|v| v.as_object())
            .and_then(|key| key.get("event_type"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| TransformError::missing("data.key.event_type"))?
            .to_owned();

        let values = data
            .get("values")
            .and_then(|v| v.as_object())
            .ok_or_else(|| TransformError::missing("data.values"))?;

        let mut alerting_event = Event::from_map(values.clone());
        alerting_event.insert("event_type", alerting_event_type);

        let nodes = self.transform(&alerting_event)?;
        if nodes.is_empty() {
            return Ok(vec![alert.into()]);
        }

        let timestamp = event.get_timestamp("event_time");
        for node in &nodes {
            alert
                .alerted_on
                .append(node.key(), EdgeOccurrence::new().timestamp_opt(timestamp));
        }

        let mut out = Vec::with_capacity(nodes.len() + 1);
        out.push(alert.into());
        out.extend(nodes);
        Ok(out)
    }
}

impl Transform for FireEyeHxTransformer {
    fn name(&self) -> &str {
        "fireeye_hx"
    }

    fn transform(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let Some(event_type) = event.get_str("event_type") else {
            return Ok(Vec::new());
        };

        // 알림 래퍼는 processPath를 갖지 않으므로 먼저 검사합니다.
        if event_type == "alertEvent" {
            return self.make_alert(event);
        }

        // 경로가 빈 processPath로는 프로세스 노드를 만들 수 없습니다.
        if let Some(path) = event.get_str("processPath")
            && path.is_empty()
        {
            return Ok(Vec::new());
        }

        match event_type {
            "processEvent" => self.make_process(event),
            "fileWriteEvent" => self.make_file(event),
            "urlMonitorEvent" => self.make_url(event),
            "ipv4NetworkEvent" => self.make_network(event),
            "dnsLookupEvent" => self.make_dnslookup(event),
            "imageLoadEvent" => self.make_imageload(event),
            "regKeyEvent" => self.make_registry(event),
            _ => Ok(Vec::new()),
        }
    }
}

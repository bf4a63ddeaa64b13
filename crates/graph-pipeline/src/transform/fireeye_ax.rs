//! FireEye AX 샌드박스 리포트 transformer
//!
//! AX 리포트의 이벤트(event_type + mode 판별)를 노드로 변환합니다.
//! network 타입은 mode에 따라 DNS/연결/HTTP로 갈라지고, HTTP 요청은
//! `GET /path HTTP/1.1~~Header: value~~...` 형태의 문자열을 다시
//! 파싱해야 합니다.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use casegraph_core::edge::EdgeOccurrence;
use casegraph_core::error::TransformError;
use casegraph_core::event::{Event, hash_algos};
use casegraph_core::node::{Domain, File, GraphNode, IpAddress, Node, Process, RegistryKey, Uri};
use casegraph_core::path::split_path;
use casegraph_core::pipeline::Transform;

/// `경로\"키"` 또는 `경로\"키" = 값` 형태의 레지스트리 값 문자열
static REG_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(.*)\\"(.*)"#).expect("static regex"));

/// FireEye AX transformer
#[derive(Debug, Default)]
pub struct FireEyeAxTransformer;

impl FireEyeAxTransformer {
    /// 새 transformer를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// processinfo 중첩 객체에서 행위 주체 프로세스를 만듭니다.
    fn subject_process(&self, event: &Event) -> Result<(Process, File), TransformError> {
        let info = Event::from_map(event.require_map("processinfo")?.clone());
        let (image, image_path) = split_path(info.require_str("imagepath")?);
        let process = Process {
            process_id: Some(info.require_i64("pid")?),
            process_image: Some(image),
            process_image_path: Some(image_path),
            ..Default::default()
        };
        let mut proc_file = process.file_node();
        proc_file.file_of.touch(process.key());
        Ok((process, proc_file))
    }

    /// process 이벤트: mode가 "started"인 경우만 의미가 있습니다.
    fn process_events(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        if event.get_str("mode") != Some("started") {
            return Ok(Vec::new());
        }

        let (image, image_path) = split_path(event.require_str("value")?);
        let (parent_image, parent_image_path) = split_path(event.require_str("parentname")?);

        let mut hashes = HashMap::new();
        for (algo, field) in [
            (hash_algos::MD5, "md5sum"),
            (hash_algos::SHA1, "sha1sum"),
            (hash_algos::SHA256, "sha256sum"),
        ] {
            if let Some(value) = event.get_string(field)
                && !value.is_empty()
            {
                hashes.insert(algo.to_owned(), value);
            }
        }

        let process = Process {
            process_id: Some(event.require_i64("pid")?),
            process_image: Some(image),
            process_image_path: Some(image_path),
            command_line: event.get_string("cmdline"),
            hashes,
            ..Default::default()
        };
        let mut proc_file = process.file_node();
        proc_file.file_of.touch(process.key());

        let mut parent = Process {
            process_id: Some(event.require_i64("ppid")?),
            process_image: Some(parent_image),
            process_image_path: Some(parent_image_path),
            ..Default::default()
        };
        let mut parent_file = parent.file_node();
        parent_file.file_of.touch(parent.key());

        parent.launched.append(
            process.key(),
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("timestamp")),
        );

        Ok(vec![
            process.into(),
            proc_file.into(),
            parent.into(),
            parent_file.into(),
        ])
    }

    /// dns_query / dns_query_answer: 응답이 있으면 해석 IP도 반환합니다.
    fn dns_events(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;
        let timestamp = event.get_timestamp("timestamp");

        let mut domain = Domain::new(event.require_string("hostname")?);
        process
            .dns_query_for
            .append(domain.key(), EdgeOccurrence::new().timestamp_opt(timestamp));

        if let Some(ip) = event.get_string("ipaddress") {
            let addr = IpAddress::new(ip);
            domain
                .resolves_to
                .append(addr.key(), EdgeOccurrence::new().timestamp_opt(timestamp));
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

    /// connect: 단일 네트워크 연결.
    fn conn_events(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;

        let addr = IpAddress::new(event.require_string("ipaddress")?);
        let port = u16::try_from(event.require_i64("destination_port")?)
            .map_err(|_| TransformError::invalid("destination_port", "port out of range"))?;

        process.connected_to.append(
            addr.key(),
            EdgeOccurrence::new()
                .timestamp_opt(event.get_timestamp("timestamp"))
                .protocol(event.require_string("protocol_type")?)
                .port(port),
        );

        Ok(vec![process.into(), proc_file.into(), addr.into()])
    }

    /// http_request: 요청 문자열에서 메서드/URI/Host 헤더를 복원합니다.
    ///
    /// 요청 문자열이 손상된 경우에는 연결 정보만으로 축소해 반환합니다.
    fn http_requests(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;
        let timestamp = event.get_timestamp("timestamp");

        let addr = IpAddress::new(event.require_string("ipaddress")?);
        let port = u16::try_from(event.require_i64("destination_port")?)
            .map_err(|_| TransformError::invalid("destination_port", "port out of range"))?;

        process.connected_to.append(
            addr.key(),
            EdgeOccurrence::new()
                .timestamp_opt(timestamp)
                .protocol(event.require_string("protocol_type")?)
                .port(port),
        );

        let Some(parsed) = event
            .get_str("http_request")
            .and_then(parse_http_request)
        else {
            return Ok(vec![process.into(), proc_file.into(), addr.into()]);
        };

        let mut uri = Uri::new(parsed.uri);
        process.http_request_to.append(
            uri.key(),
            EdgeOccurrence::new()
                .timestamp_opt(timestamp)
                .method(parsed.method),
        );

        if let Some(host) = parsed.host {
            let mut domain = Domain::new(host);
            domain
                .resolves_to
                .append(addr.key(), EdgeOccurrence::new().timestamp_opt(timestamp));
            uri.uri_of.touch(domain.key());
            Ok(vec![
                process.into(),
                proc_file.into(),
                addr.into(),
                uri.into(),
                domain.into(),
            ])
        } else {
            Ok(vec![
                process.into(),
                proc_file.into(),
                addr.into(),
                uri.into(),
            ])
        }
    }

    /// file 이벤트: 생성/삭제/복사/접근.
    fn file_events(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;
        let timestamp = event.get_timestamp("timestamp");

        // 8.2.0부터 mode가 failed인 경우 value가 중첩 객체로 바뀌었습니다.
        let full_path = match event.get_map("values") {
            Some(values) => Event::from_map(values.clone()).require_string("value")?,
            None => event.require_string("value")?,
        };

        let (file_name, file_path) = split_path(&full_path);
        let mut file_node = File {
            file_name: Some(file_name),
            file_path: Some(file_path),
            ..Default::default()
        };
        file_node.set_extension();

        match event.get_str("mode") {
            Some("created") => {
                process
                    .wrote
                    .append(file_node.key(), EdgeOccurrence::new().timestamp_opt(timestamp));
            }
            Some("deleted") => {
                process
                    .deleted
                    .append(file_node.key(), EdgeOccurrence::new().timestamp_opt(timestamp));
            }
            Some("CopyFile") => {
                let (src_name, src_path) = split_path(event.require_str("source")?);
                let mut src_file = File {
                    file_name: Some(src_name),
                    file_path: Some(src_path),
                    ..Default::default()
                };
                src_file.set_extension();

                src_file
                    .copied_to
                    .append(file_node.key(), EdgeOccurrence::new().timestamp_opt(timestamp));
                process
                    .copied
                    .append(src_file.key(), EdgeOccurrence::new().timestamp_opt(timestamp));

                return Ok(vec![
                    process.into(),
                    proc_file.into(),
                    file_node.into(),
                    src_file.into(),
                ]);
            }
            _ => {
                process
                    .accessed
                    .append(file_node.key(), EdgeOccurrence::new().timestamp_opt(timestamp));
            }
        }

        Ok(vec![process.into(), proc_file.into(), file_node.into()])
    }

    /// regkey 이벤트: 패킹된 값 문자열을 (경로, 키, 값)으로 분해합니다.
    fn regkey_events(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;
        let timestamp = event.get_timestamp("timestamp");

        let raw = event.require_str("value")?;
        let caps = REG_VALUE_RE
            .captures(raw)
            .ok_or_else(|| TransformError::invalid("value", "unparsable registry value string"))?;
        let path = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let mut key_contents = caps.get(2).map(|m| m.as_str()).unwrap_or_default().to_owned();

        // 마지막 따옴표 제거
        if key_contents.ends_with('"') {
            key_contents.pop();
        }

        // `" = ` 구분자가 없으면 값 없이 키만 기록된 형태입니다.
        let (key, value) = match key_contents.split_once("\" = ") {
            Some((key, value)) => (key.to_owned(), Some(value.to_owned())),
            None => (key_contents, None),
        };

        let (hive, reg_key_path) = path
            .replace("\\REGISTRY\\", "")
            .split_once('\\')
            .map(|(hive, rest)| (hive.to_owned(), rest.to_owned()))
            .ok_or_else(|| TransformError::invalid("value", "registry path without hive"))?;

        let reg_node = RegistryKey {
            hive: Some(hive),
            key: Some(key),
            key_path: Some(reg_key_path),
            value: value.clone(),
            ..Default::default()
        };

        let occurrence = EdgeOccurrence::new()
            .timestamp_opt(timestamp)
            .value_opt(value);
        match event.get_str("mode") {
            Some("added") => process.created_key.append(reg_node.key(), occurrence),
            Some("setval") => process.changed_value.append(reg_node.key(), occurrence),
            Some("deleteval") | Some("deleted") => {
                process.deleted_key.append(reg_node.key(), occurrence)
            }
            _ => process.read_key.append(reg_node.key(), occurrence),
        }

        Ok(vec![process.into(), proc_file.into(), reg_node.into()])
    }
}

impl Transform for FireEyeAxTransformer {
    fn name(&self) -> &str {
        "fireeye_ax"
    }

    fn transform(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        match event.get_str("event_type") {
            Some("process") => self.process_events(event),
            Some("network") => match event.get_str("mode") {
                Some("dns_query") | Some("dns_query_answer") => self.dns_events(event),
                Some("connect") => self.conn_events(event),
                Some("http_request") => self.http_requests(event),
                _ => Ok(Vec::new()),
            },
            Some("file") => self.file_events(event),
            Some("regkey") => self.regkey_events(event),
            _ => Ok(Vec::new()),
        }
    }
}

/// 파싱된 HTTP 요청 문자열
struct ParsedHttpRequest {
    method: String,
    uri: String,
    host: Option<String>,
}

/// `GET /path HTTP/1.1~~Header: v~~...` 문자열을 분해합니다.
///
/// 요청 라인이 3조각이 아니면 None (손상된 레코드).
fn parse_http_request(raw: &str) -> Option<ParsedHttpRequest> {
    let (request_line, headers) = raw.split_once("~~")?;

    let mut parts = request_line.split(' ');
    let method = parts.next()?;
    let uri = parts.next()?;
    parts.next()?; // HTTP 버전
    if parts.next().is_some() {
        return None;
    }

    let host = headers.split("~~").find_map(|header| {
        let (name, value) = header.split_once(": ")?;
        (name == "Host").then(|| value.to_owned())
    });

    Some(ParsedHttpRequest {
        method: method.to_owned(),
        uri: uri.to_owned(),
        host,
    })
}

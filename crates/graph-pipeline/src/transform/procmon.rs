//! Process Monitor transformer
//!
//! Procmon CSV 내보내기에서 뽑은 이벤트를 노드로 변환합니다.
//! operation 문자열로 분기하며, 프로세스 생성의 PID/커맨드라인은
//! `params` 필드 문자열에서 정규식으로 추출합니다.

use std::sync::LazyLock;

use regex::Regex;

use casegraph_core::edge::EdgeOccurrence;
use casegraph_core::error::TransformError;
use casegraph_core::event::Event;
use casegraph_core::node::{File, GraphNode, IpAddress, Node, Process, RegistryKey};
use casegraph_core::path::{split_path, split_reg_path};
use casegraph_core::pipeline::Transform;

/// "PID: 1234, Command line: foo.exe -x" 형태의 params 필드
static PARAMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PID: (\d*), Command line: (.*)").expect("static regex"));

/// Process Monitor transformer
#[derive(Debug, Default)]
pub struct ProcmonTransformer;

impl ProcmonTransformer {
    /// 새 transformer를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 행위 주체 프로세스 (procmon은 PID와 프로세스명만 보고)
    fn subject_process(&self, event: &Event) -> Result<Process, TransformError> {
        Ok(Process {
            process_id: Some(event.require_i64("process_id")?),
            process_image: Some(event.require_string("process_name")?),
            ..Default::default()
        })
    }

    /// Process Create: params에서 자식 PID/커맨드라인 추출.
    ///
    /// params가 예상 형식이 아니면 PID는 -1, 커맨드라인은 없음으로
    /// 둡니다 (procmon 출력에서 실제로 관찰되는 형태).
    fn process_create(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let params = event.require_str("params")?;
        let (pid, command_line) = match PARAMS_RE.captures(params) {
            Some(caps) => (
                caps.get(1)
                    .and_then(|m| m.as_str().parse::<i64>().ok())
                    .unwrap_or(-1),
                caps.get(2).map(|m| m.as_str().to_owned()),
            ),
            None => (-1, None),
        };

        let (image, image_path) = split_path(event.require_str("path")?);
        let process = Process {
            process_id: Some(pid),
            process_image: Some(image),
            process_image_path: Some(image_path),
            command_line,
            ..Default::default()
        };
        let mut proc_file = process.file_node();
        proc_file.file_of.touch(process.key());

        let mut parent = self.subject_process(event)?;
        parent.launched.append(
            process.key(),
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("event_time")),
        );

        Ok(vec![process.into(), proc_file.into(), parent.into()])
    }

    /// WriteFile/CreateFile: 파일 쓰기.
    fn write_file(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let mut process = self.subject_process(event)?;
        let (file_name, file_path) = split_path(event.require_str("path")?);
        let target = File {
            file_name: Some(file_name),
            file_path: Some(file_path),
            ..Default::default()
        };
        process.wrote.append(
            target.key(),
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("event_time")),
        );
        Ok(vec![process.into(), target.into()])
    }

    /// CloseFile/ReadFile: 파일 접근.
    fn access_file(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let mut process = self.subject_process(event)?;
        let (file_name, file_path) = split_path(event.require_str("path")?);
        let target = File {
            file_name: Some(file_name),
            file_path: Some(file_path),
            ..Default::default()
        };
        process.accessed.append(
            target.key(),
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("event_time")),
        );
        Ok(vec![process.into(), target.into()])
    }

    /// Reg*Key/Value: 레지스트리 키 읽기.
    fn access_reg_key(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let mut process = self.subject_process(event)?;
        let (hive, key, key_path) = split_reg_path(event.require_str("path")?);
        let reg_node = RegistryKey {
            hive: Some(hive),
            key: Some(key),
            key_path: Some(key_path),
            ..Default::default()
        };
        process.read_key.append(
            reg_node.key(),
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("event_time")),
        );
        Ok(vec![process.into(), reg_node.into()])
    }

    /// TCP/UDP 연결. path는 "src:port -> dest:port" 형태이며 IPv6
    /// 주소의 콜론을 고려해 마지막 콜론에서 포트를 분리합니다.
    fn connection(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let mut process = self.subject_process(event)?;

        let path = event.require_str("path")?;
        let dest = path.rsplit("->").next().unwrap_or(path).trim();
        let (ip, port) = dest
            .rsplit_once(':')
            .ok_or_else(|| TransformError::invalid("path", "expected destination ip:port"))?;
        let port: u16 = port
            .parse()
            .map_err(|_| TransformError::invalid("path", "invalid destination port"))?;

        let operation = event.require_str("event_type")?;
        let protocol = operation.split(' ').next().unwrap_or(operation);

        let addr = IpAddress::new(ip);
        process.connected_to.append(
            addr.key(),
            EdgeOccurrence::new()
                .timestamp_opt(event.get_timestamp("event_time"))
                .port(port)
                .protocol(protocol),
        );

        Ok(vec![process.into(), addr.into()])
    }
}

impl Transform for ProcmonTransformer {
    fn name(&self) -> &str {
        "procmon"
    }

    fn transform(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let Some(operation) = event.get_str("event_type") else {
            return Ok(Vec::new());
        };

        match operation {
            "Process Create" => self.process_create(event),
            "WriteFile" | "CreateFile" => self.write_file(event),
            "CloseFile" | "ReadFile" => self.access_file(event),
            "RegOpenKey" | "RegQueryKey" | "RegQueryValue" | "RegCloseKey" => {
                self.access_reg_key(event)
            }
            "TCP Send" | "TCP Receive" | "TCP Connect" | "UDP Connect" | "UDP Receive" => {
                self.connection(event)
            }
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformer() -> ProcmonTransformer {
        ProcmonTransformer::new()
    }

    fn base_event(operation: &str, path: &str) -> Event {
        Event::new()
            .with("event_type", operation)
            .with("process_id", 1024)
            .with("process_name", "explorer.exe")
            .with("path", path)
            .with("event_time", 1000)
    }

    #[test]
    fn unknown_operation_is_noop() {
        let event = base_event("QueryOpen", "C:\\x");
        assert!(transformer().transform(&event).unwrap().is_empty());
    }

    #[test]
    fn process_create_extracts_pid_and_command_line() {
        let event = base_event("Process Create", "C:\\Temp\\child.exe")
            .with("params", "PID: 2048, Command line: child.exe -x --now");
        let nodes = transformer().transform(&event).unwrap();
        assert_eq!(nodes.len(), 3);

        let child = nodes[0].as_process().unwrap();
        let parent = nodes[2].as_process().unwrap();

        assert_eq!(child.process_id, Some(2048));
        assert_eq!(child.command_line.as_deref(), Some("child.exe -x --now"));
        assert_eq!(child.process_image.as_deref(), Some("child.exe"));
        assert_eq!(parent.process_id, Some(1024));

        let occs = parent.launched.occurrences(&child.key()).unwrap();
        assert_eq!(occs[0].timestamp, Some(1000));
    }

    #[test]
    fn process_create_with_malformed_params_defaults() {
        let event = base_event("Process Create", "C:\\Temp\\child.exe")
            .with("params", "no structure here");
        let nodes = transformer().transform(&event).unwrap();
        let child = nodes[0].as_process().unwrap();
        assert_eq!(child.process_id, Some(-1));
        assert_eq!(child.command_line, None);
    }

    #[test]
    fn write_file_creates_wrote_edge() {
        let event = base_event("WriteFile", "C:\\Users\\admin\\drop.exe");
        let nodes = transformer().transform(&event).unwrap();
        assert_eq!(nodes.len(), 2);

        let process = nodes[0].as_process().unwrap();
        let file = nodes[1].as_file().unwrap();
        assert_eq!(file.file_name.as_deref(), Some("drop.exe"));
        assert!(process.wrote.contains(&file.key()));
    }

    #[test]
    fn read_file_creates_accessed_edge() {
        let event = base_event("ReadFile", "C:\\Windows\\hosts");
        let nodes = transformer().transform(&event).unwrap();
        let process = nodes[0].as_process().unwrap();
        assert!(process.accessed.contains(&nodes[1].key()));
    }

    #[test]
    fn reg_query_splits_hive_and_key() {
        let event = base_event(
            "RegQueryValue",
            "HKLM\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Run\\Updater",
        );
        let nodes = transformer().transform(&event).unwrap();
        assert_eq!(nodes.len(), 2);

        let process = nodes[0].as_process().unwrap();
        let reg = nodes[1].as_registry_key().unwrap();
        assert_eq!(reg.hive.as_deref(), Some("HKLM"));
        assert_eq!(reg.key.as_deref(), Some("Updater"));
        assert_eq!(
            reg.key_path.as_deref(),
            Some("SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Run")
        );
        assert!(process.read_key.contains(&reg.key()));
    }

    #[test]
    fn tcp_connect_parses_destination() {
        let event = base_event("TCP Connect", "ws-01.corp:49721 -> 203.0.113.9:443");
        let nodes = transformer().transform(&event).unwrap();
        assert_eq!(nodes.len(), 2);

        let process = nodes[0].as_process().unwrap();
        let addr = nodes[1].as_ip_address().unwrap();
        assert_eq!(addr.ip_address.as_deref(), Some("203.0.113.9"));

        let occs = process.connected_to.occurrences(&addr.key()).unwrap();
        assert_eq!(occs[0].port, Some(443));
        assert_eq!(occs[0].protocol.as_deref(), Some("TCP"));
    }

    #[test]
    fn udp_receive_parses_ipv6_destination() {
        let event = base_event("UDP Receive", "ws-01:500 -> 2001:db8::9:53");
        let nodes = transformer().transform(&event).unwrap();
        let addr = nodes[1].as_ip_address().unwrap();
        assert_eq!(addr.ip_address.as_deref(), Some("2001:db8::9"));

        let process = nodes[0].as_process().unwrap();
        let occs = process.connected_to.occurrences(&addr.key()).unwrap();
        assert_eq!(occs[0].port, Some(53));
        assert_eq!(occs[0].protocol.as_deref(), Some("UDP"));
    }

    #[test]
    fn connection_without_port_errors() {
        let event = base_event("TCP Send", "garbage");
        assert!(transformer().transform(&event).is_err());
    }
}

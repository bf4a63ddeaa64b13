//! Sysmon transformer
//!
//! Sysmon 이벤트 로그(EventID 판별)를 노드로 변환합니다. 프로세스
//! 노드는 Sysmon이 부여하는 process GUID를 식별자로 사용하므로, 같은
//! PID가 재사용되어도 다른 프로세스로 구분됩니다.
//!
//! # 처리하는 EventID
//! - 1: 프로세스 생성
//! - 3: 네트워크 연결
//! - 11: 파일 생성
//! - 13/14/15: 레지스트리 이벤트
//! - 22: DNS 조회

use std::collections::HashMap;

use casegraph_core::edge::EdgeOccurrence;
use casegraph_core::error::TransformError;
use casegraph_core::event::Event;
use casegraph_core::node::{Domain, File, GraphNode, IpAddress, Node, Process, RegistryKey};
use casegraph_core::path::{split_path, split_reg_path};
use casegraph_core::pipeline::Transform;

/// Sysmon transformer
#[derive(Debug, Default)]
pub struct SysmonTransformer;

impl SysmonTransformer {
    /// 새 transformer를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 이벤트의 행위 주체 프로세스를 GUID 식별자와 함께 만듭니다.
    fn subject_process(&self, event: &Event) -> Result<(Process, File), TransformError> {
        let (image, image_path) = split_path(event.require_str("EventData_Image")?);
        let process = Process {
            guid: Some(event.require_string("EventData_ProcessGuid")?),
            host: Some(event.require_string("Computer")?),
            user: event.get_string("EventData_User"),
            process_id: Some(event.require_i64("EventData_ProcessId")?),
            process_image: Some(image),
            process_image_path: Some(image_path),
            ..Default::default()
        };
        let mut proc_file = process.file_node();
        proc_file.file_of.touch(process.key());
        Ok((process, proc_file))
    }

    /// EventID 1: 프로세스 생성.
    fn process_creation(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (parent_image, parent_path) = split_path(event.require_str("EventData_ParentImage")?);
        let mut parent = Process {
            guid: Some(event.require_string("EventData_ParentProcessGuid")?),
            host: Some(event.require_string("Computer")?),
            process_id: Some(event.require_i64("EventData_ParentProcessId")?),
            process_image: Some(parent_image),
            process_image_path: Some(parent_path),
            ..Default::default()
        };
        let mut parent_file = parent.file_node();
        parent_file.file_of.touch(parent.key());

        let (image, image_path) = split_path(event.require_str("EventData_Image")?);
        let process = Process {
            guid: Some(event.require_string("EventData_ProcessGuid")?),
            host: Some(event.require_string("Computer")?),
            user: event.get_string("EventData_User"),
            process_id: Some(event.require_i64("EventData_ProcessId")?),
            process_image: Some(image),
            process_image_path: Some(image_path),
            command_line: event.get_string("EventData_CommandLine"),
            hashes: parse_hash_list(event.require_str("EventData_Hashes")?),
            ..Default::default()
        };
        let mut proc_file = process.file_node();
        proc_file.file_of.touch(process.key());

        parent.launched.append(
            process.key(),
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("EventData_UtcTime")),
        );

        Ok(vec![
            parent.into(),
            parent_file.into(),
            process.into(),
            proc_file.into(),
        ])
    }

    /// EventID 3: 네트워크 연결. 목적지 호스트명이 있으면 Domain도 반환.
    fn network_connection(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;

        let dest_addr = IpAddress::new(event.require_string("EventData_DestinationIp")?);

        let mut occurrence =
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("EventData_UtcTime"));
        if let Some(port) = event.get_i64("EventData_DestinationPort") {
            let port = u16::try_from(port).map_err(|_| {
                TransformError::invalid("EventData_DestinationPort", "port out of range")
            })?;
            occurrence = occurrence.port(port);
        }
        if let Some(protocol) = event.get_string("EventData_Protocol") {
            occurrence = occurrence.protocol(protocol);
        }
        process.connected_to.append(dest_addr.key(), occurrence);

        if let Some(hostname) = event.get_string("EventData_DestinationHostname")
            && !hostname.is_empty()
        {
            let mut domain = Domain::new(hostname);
            domain.resolves_to.append(
                dest_addr.key(),
                EdgeOccurrence::new().timestamp_opt(event.get_timestamp("EventData_UtcTime")),
            );
            return Ok(vec![
                process.into(),
                proc_file.into(),
                dest_addr.into(),
                domain.into(),
            ]);
        }

        Ok(vec![process.into(), proc_file.into(), dest_addr.into()])
    }

    /// EventID 11: 파일 생성.
    fn file_created(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;

        let (file_name, file_path) = split_path(event.require_str("EventData_TargetFilename")?);
        let file_node = File {
            file_name: Some(file_name),
            file_path: Some(file_path),
            ..Default::default()
        };

        process.accessed.append(
            file_node.key(),
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("EventData_UtcTime")),
        );

        Ok(vec![process.into(), proc_file.into(), file_node.into()])
    }

    /// EventID 13/14/15: 레지스트리 이벤트.
    ///
    /// TargetObject가 없는 레코드는 의미가 없으므로 no-op입니다.
    fn registry_event(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        if !event.contains("EventData_TargetObject") {
            return Ok(Vec::new());
        }

        let (mut process, proc_file) = self.subject_process(event)?;

        let (hive, key, key_path) = split_reg_path(event.require_str("EventData_TargetObject")?);
        let reg_node = RegistryKey {
            host: event.get_string("Computer"),
            hive: Some(hive),
            key: Some(key),
            key_path: Some(key_path),
            value: event.get_string("EventData_Details"),
            ..Default::default()
        };

        let timestamp = event.get_timestamp("EventData_UtcTime");
        match event.require_str("EventData_EventType")? {
            "SetValue" => process.changed_value.append(
                reg_node.key(),
                EdgeOccurrence::new()
                    .timestamp_opt(timestamp)
                    .value_opt(event.get_string("EventData_Details")),
            ),
            "DeleteValue" => process
                .deleted_value
                .append(reg_node.key(), EdgeOccurrence::new().timestamp_opt(timestamp)),
            "CreateKey" => process
                .created_key
                .append(reg_node.key(), EdgeOccurrence::new().timestamp_opt(timestamp)),
            "DeleteKey" => process
                .deleted_key
                .append(reg_node.key(), EdgeOccurrence::new().timestamp_opt(timestamp)),
            other => {
                tracing::debug!(event_type = other, "unhandled sysmon registry event type");
            }
        }

        Ok(vec![process.into(), proc_file.into(), reg_node.into()])
    }

    /// EventID 22: DNS 조회.
    fn dns_lookup(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let (mut process, proc_file) = self.subject_process(event)?;

        let domain = Domain::new(event.require_string("EventData_QueryName")?);
        process.dns_query_for.append(
            domain.key(),
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("EventData_UtcTime")),
        );

        Ok(vec![process.into(), proc_file.into(), domain.into()])
    }
}

impl Transform for SysmonTransformer {
    fn name(&self) -> &str {
        "sysmon"
    }

    fn transform(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let Some(event_id) = event.get_i64("EventID") else {
            return Ok(Vec::new());
        };

        match event_id {
            1 => self.process_creation(event),
            3 => self.network_connection(event),
            11 => self.file_created(event),
            13..=15 => self.registry_event(event),
            22 => self.dns_lookup(event),
            _ => Ok(Vec::new()),
        }
    }
}

/// Sysmon 해시 문자열("MD5=..,SHA256=..")을 알고리즘→값 맵으로 파싱합니다.
///
/// 알고리즘 이름은 소문자로 정규화합니다. `=`가 없는 조각은 버립니다.
fn parse_hash_list(hashes: &str) -> HashMap<String, String> {
    hashes
        .split(',')
        .filter_map(|pair| {
            let (algo, value) = pair.split_once('=')?;
            Some((algo.trim().to_lowercase(), value.trim().to_owned()))
        })
        .collect()
}

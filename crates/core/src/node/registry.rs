//! 레지스트리 키 노드

use serde::Serialize;

use crate::edge::EdgeMap;
use crate::node::{GraphNode, NodeKey, key_part};

/// 레지스트리 키 노드
///
/// 기본 키 필드는 {hive, key_path, key}이며, `guid`가 설정되면 guid가
/// 유일한 키 필드입니다. 값/값 타입은 관찰된 경우에만 기록됩니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistryKey {
    /// 소스 고유 식별자 — 설정 시 유일한 키 필드
    pub guid: Option<String>,
    /// 호스트명
    pub host: Option<String>,
    /// 하이브 (예: "HKEY_LOCAL_MACHINE")
    pub hive: Option<String>,
    /// 하이브와 키 사이의 경로
    pub key_path: Option<String>,
    /// 키 이름
    pub key: Option<String>,
    /// 관찰된 값
    pub value: Option<String>,
    /// 값 타입 (예: "DWORD")
    pub value_type: Option<String>,
}

impl GraphNode for RegistryKey {
    fn node_type(&self) -> &'static str {
        "registry_key"
    }

    fn key(&self) -> NodeKey {
        match &self.guid {
            Some(guid) => NodeKey::new(self.node_type(), vec![guid.clone()]),
            None => NodeKey::new(
                self.node_type(),
                vec![
                    key_part(&self.hive),
                    key_part(&self.key_path),
                    key_part(&self.key),
                ],
            ),
        }
    }

    fn display(&self) -> String {
        self.key.clone().unwrap_or_default()
    }

    fn edges(&self) -> Vec<(&'static str, &EdgeMap)> {
        Vec::new()
    }
}

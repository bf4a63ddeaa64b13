//! 파일 노드

use std::collections::HashMap;

use serde::Serialize;

use crate::edge::EdgeMap;
use crate::node::{GraphNode, NodeKey, key_part};

/// 파일 노드
///
/// 기본 키 필드는 {host, file_path, file_name}이며, `guid`가 설정되면
/// guid가 유일한 키 필드입니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct File {
    /// 소스 고유 식별자 — 설정 시 유일한 키 필드
    pub guid: Option<String>,
    /// 호스트명
    pub host: Option<String>,
    /// 디렉토리 경로
    pub file_path: Option<String>,
    /// 파일명
    pub file_name: Option<String>,
    /// 전체 경로 (소스가 별도 보고하는 경우)
    pub full_path: Option<String>,
    /// 확장자 (file_name에서 파생)
    pub extension: Option<String>,
    /// 파일 해시 (md5/sha1/sha256)
    pub hashes: HashMap<String, String>,

    /// 이 파일을 이미지로 갖는 프로세스
    pub file_of: EdgeMap,
    /// 이 파일이 복사된 대상 파일
    pub copied_to: EdgeMap,
}

impl File {
    /// 파일명에서 확장자를 파생해 설정합니다.
    ///
    /// 마지막 점 뒤의 문자열을 확장자로 기록합니다. 점이 없으면
    /// 변경하지 않습니다.
    pub fn set_extension(&mut self) {
        if let Some(name) = &self.file_name
            && let Some((_, ext)) = name.rsplit_once('.')
            && !ext.is_empty()
        {
            self.extension = Some(ext.to_owned());
        }
    }
}

impl GraphNode for File {
    fn node_type(&self) -> &'static str {
        "file"
    }

    fn key(&self) -> NodeKey {
        match &self.guid {
            Some(guid) => NodeKey::new(self.node_type(), vec![guid.clone()]),
            None => NodeKey::new(
                self.node_type(),
                vec![
                    key_part(&self.host),
                    key_part(&self.file_path),
                    key_part(&self.file_name),
                ],
            ),
        }
    }

    fn display(&self) -> String {
        self.file_name.clone().unwrap_or_default()
    }

    fn edges(&self) -> Vec<(&'static str, &EdgeMap)> {
        vec![("file_of", &self.file_of), ("copied_to", &self.copied_to)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_uses_host_path_name() {
        let file = File {
            host: Some("ws-01".to_owned()),
            file_path: Some("C:\\Temp".to_owned()),
            file_name: Some("a.txt".to_owned()),
            ..Default::default()
        };
        assert_eq!(file.key().parts, vec!["ws-01", "C:\\Temp", "a.txt"]);
    }

    #[test]
    fn key_prefers_guid() {
        let file = File {
            guid: Some("uuid-9".to_owned()),
            file_name: Some("a.txt".to_owned()),
            ..Default::default()
        };
        assert_eq!(file.key().parts, vec!["uuid-9"]);
    }

    #[test]
    fn set_extension_splits_last_dot() {
        let mut file = File {
            file_name: Some("archive.tar.gz".to_owned()),
            ..Default::default()
        };
        file.set_extension();
        assert_eq!(file.extension.as_deref(), Some("gz"));
    }

    #[test]
    fn set_extension_without_dot_is_noop() {
        let mut file = File {
            file_name: Some("README".to_owned()),
            ..Default::default()
        };
        file.set_extension();
        assert_eq!(file.extension, None);
    }

    #[test]
    fn set_extension_trailing_dot_is_noop() {
        let mut file = File {
            file_name: Some("weird.".to_owned()),
            ..Default::default()
        };
        file.set_extension();
        assert_eq!(file.extension, None);
    }
}

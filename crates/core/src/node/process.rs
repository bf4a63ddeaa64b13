//! 프로세스 노드

use std::collections::HashMap;

use serde::Serialize;

use crate::edge::EdgeMap;
use crate::node::{File, GraphNode, NodeKey, key_part};

/// 프로세스 노드
///
/// 기본 키 필드는 {host, process_id, process_image}입니다.
/// `guid`가 설정되면(Sysmon process GUID, DARPA TC UUID) guid가 유일한
/// 키 필드가 됩니다. 나머지 속성은 소스가 주는 만큼만 채워집니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Process {
    /// 소스 고유 식별자 — 설정 시 유일한 키 필드
    pub guid: Option<String>,
    /// 호스트명
    pub host: Option<String>,
    /// 실행 사용자
    pub user: Option<String>,
    /// 프로세스 ID
    pub process_id: Option<i64>,
    /// 이미지명 (예: "cmd.exe")
    pub process_image: Option<String>,
    /// 이미지 디렉토리 경로
    pub process_image_path: Option<String>,
    /// 커맨드라인
    pub command_line: Option<String>,
    /// 이미지 해시 (md5/sha1/sha256)
    pub hashes: HashMap<String, String>,

    // --- 프로세스 엣지 ---
    /// 실행한 자식 프로세스
    pub launched: EdgeMap,

    // --- 파일 엣지 ---
    /// 쓴 파일
    pub wrote: EdgeMap,
    /// 접근한 파일
    pub accessed: EdgeMap,
    /// 로드한 모듈 (DLL 등)
    pub loaded: EdgeMap,
    /// 삭제한 파일
    pub deleted: EdgeMap,
    /// 복사한 파일. 원본 파일에서 대상 파일로의 copied_to 엣지와 함께
    /// Process -[copied]-> File -[copied_to]-> File 형태를 이룹니다.
    pub copied: EdgeMap,

    // --- 네트워크 엣지 ---
    /// 연결한 IP 주소
    pub connected_to: EdgeMap,
    /// HTTP 요청을 보낸 URI
    pub http_request_to: EdgeMap,
    /// DNS 조회한 도메인
    pub dns_query_for: EdgeMap,

    // --- 레지스트리 엣지 ---
    /// 생성한 키
    pub created_key: EdgeMap,
    /// 값을 변경한 키
    pub changed_value: EdgeMap,
    /// 값을 삭제한 키
    pub deleted_value: EdgeMap,
    /// 삭제한 키
    pub deleted_key: EdgeMap,
    /// 읽은 키
    pub read_key: EdgeMap,
}

impl Process {
    /// 이미지와 경로를 합친 전체 경로를 반환합니다.
    ///
    /// 경로가 역슬래시로 끝나면 그대로 잇고, 아니면 구분자를 넣습니다.
    pub fn process_path(&self) -> Option<String> {
        match (&self.process_image_path, &self.process_image) {
            (Some(path), Some(image)) => {
                if path.ends_with('\\') {
                    Some(format!("{path}{image}"))
                } else {
                    Some(format!("{path}\\{image}"))
                }
            }
            _ => None,
        }
    }

    /// 프로세스 이미지에 해당하는 File 노드를 생성합니다.
    ///
    /// 해시는 프로세스에 기록된 것을 그대로 넘깁니다.
    pub fn file_node(&self) -> File {
        File {
            host: self.host.clone(),
            file_path: self.process_image_path.clone(),
            file_name: self.process_image.clone(),
            hashes: self.hashes.clone(),
            ..Default::default()
        }
    }

    /// 엣지를 제외한 속성만 복제합니다.
    ///
    /// EVTX transformer가 프로세스 조회 맵에 스냅샷을 보관할 때
    /// 사용합니다.
    pub fn bare_clone(&self) -> Self {
        Self {
            guid: self.guid.clone(),
            host: self.host.clone(),
            user: self.user.clone(),
            process_id: self.process_id,
            process_image: self.process_image.clone(),
            process_image_path: self.process_image_path.clone(),
            command_line: self.command_line.clone(),
            hashes: self.hashes.clone(),
            ..Default::default()
        }
    }
}

impl GraphNode for Process {
    fn node_type(&self) -> &'static str {
        "process"
    }

    fn key(&self) -> NodeKey {
        match &self.guid {
            Some(guid) => NodeKey::new(self.node_type(), vec![guid.clone()]),
            None => NodeKey::new(
                self.node_type(),
                vec![
                    key_part(&self.host),
                    self.process_id.map(|p| p.to_string()).unwrap_or_default(),
                    key_part(&self.process_image),
                ],
            ),
        }
    }

    fn display(&self) -> String {
        self.process_image.clone().unwrap_or_default()
    }

    fn edges(&self) -> Vec<(&'static str, &EdgeMap)> {
        vec![
            ("launched", &self.launched),
            ("wrote", &self.wrote),
            ("accessed", &self.accessed),
            ("loaded", &self.loaded),
            ("deleted", &self.deleted),
            ("copied", &self.copied),
            ("connected_to", &self.connected_to),
            ("http_request_to", &self.http_request_to),
            ("dns_query_for", &self.dns_query_for),
            ("created_key", &self.created_key),
            ("changed_value", &self.changed_value),
            ("deleted_value", &self.deleted_value),
            ("deleted_key", &self.deleted_key),
            ("read_key", &self.read_key),
        ]
    }
}

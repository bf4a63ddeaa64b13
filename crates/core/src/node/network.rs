//! 네트워크 노드 — IP 주소, 도메인, URI

use serde::Serialize;

use crate::edge::EdgeMap;
use crate::node::{GraphNode, NodeKey, key_part};

/// IP 주소 노드
///
/// 기본 키 필드는 {ip_address}이며, `guid`가 설정되면 guid가 유일한
/// 키 필드입니다. PCAP처럼 호스트 개념이 없는 소스에서는 IP 자체가
/// 행위 주체가 되어 연결/조회 엣지를 가질 수 있습니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IpAddress {
    /// 소스 고유 식별자 — 설정 시 유일한 키 필드
    pub guid: Option<String>,
    /// IP 주소 문자열 (IPv4/IPv6)
    pub ip_address: Option<String>,
    /// MAC 주소 (패킷 캡처 소스)
    pub mac: Option<String>,

    /// 연결한 상대 IP
    pub connected_to: EdgeMap,
    /// HTTP 요청을 보낸 URI
    pub http_request_to: EdgeMap,
    /// DNS 조회한 도메인
    pub dns_query_for: EdgeMap,
}

impl IpAddress {
    /// 주소 문자열로 IP 노드를 생성합니다.
    pub fn new(ip_address: impl Into<String>) -> Self {
        Self {
            ip_address: Some(ip_address.into()),
            ..Self::default()
        }
    }
}

impl GraphNode for IpAddress {
    fn node_type(&self) -> &'static str {
        "ip_address"
    }

    fn key(&self) -> NodeKey {
        match &self.guid {
            Some(guid) => NodeKey::new(self.node_type(), vec![guid.clone()]),
            None => NodeKey::new(self.node_type(), vec![key_part(&self.ip_address)]),
        }
    }

    fn display(&self) -> String {
        self.ip_address.clone().unwrap_or_default()
    }

    fn edges(&self) -> Vec<(&'static str, &EdgeMap)> {
        vec![
            ("connected_to", &self.connected_to),
            ("http_request_to", &self.http_request_to),
            ("dns_query_for", &self.dns_query_for),
        ]
    }
}

/// 도메인 노드 — 키 필드는 {domain}
#[derive(Debug, Clone, Default, Serialize)]
pub struct Domain {
    /// 도메인명
    pub domain: String,

    /// 이 도메인이 해석된 IP 주소
    pub resolves_to: EdgeMap,
}

impl Domain {
    /// 도메인명으로 노드를 생성합니다.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }
}

impl GraphNode for Domain {
    fn node_type(&self) -> &'static str {
        "domain"
    }

    fn key(&self) -> NodeKey {
        NodeKey::new(self.node_type(), vec![self.domain.clone()])
    }

    fn display(&self) -> String {
        self.domain.clone()
    }

    fn edges(&self) -> Vec<(&'static str, &EdgeMap)> {
        vec![("resolves_to", &self.resolves_to)]
    }
}

/// URI 노드 — 키 필드는 {uri}
#[derive(Debug, Clone, Default, Serialize)]
pub struct Uri {
    /// 요청 경로 (예: "/index.html")
    pub uri: String,

    /// 이 URI가 속한 도메인
    pub uri_of: EdgeMap,
}

impl Uri {
    /// 경로 문자열로 URI 노드를 생성합니다.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }
}

impl GraphNode for Uri {
    fn node_type(&self) -> &'static str {
        "uri"
    }

    fn key(&self) -> NodeKey {
        NodeKey::new(self.node_type(), vec![self.uri.clone()])
    }

    fn display(&self) -> String {
        self.uri.clone()
    }

    fn edges(&self) -> Vec<(&'static str, &EdgeMap)> {
        vec![("uri_of", &self.uri_of)]
    }
}

//! PCAP transformer
//!
//! 패킷 캡처에서 요약된 레코드를 노드로 변환합니다. 프로세스 정보가
//! 없는 소스이므로 출발지 IP가 행위 주체가 되어 연결/조회 엣지를
//! 소유합니다. IP/Ether 수준의 레코드나 src/dst가 없는 레코드는
//! 의미가 없어 버립니다.

use casegraph_core::edge::EdgeOccurrence;
use casegraph_core::error::TransformError;
use casegraph_core::event::Event;
use casegraph_core::node::{Domain, GraphNode, IpAddress, Node, Uri};
use casegraph_core::pipeline::Transform;

/// PCAP transformer
#[derive(Debug, Default)]
pub struct PcapTransformer;

impl PcapTransformer {
    /// 새 transformer를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// src/dst IP 노드 쌍을 만들고 src→dst 연결 엣지를 기록합니다.
    fn endpoints(&self, event: &Event) -> Option<(IpAddress, IpAddress)> {
        let src_ip = event.get_string("src_ip")?;
        let dst_ip = event.get_string("dst_ip")?;

        let mut src = IpAddress::new(src_ip);
        src.mac = event.get_string("src_mac");
        let mut dst = IpAddress::new(dst_ip);
        dst.mac = event.get_string("dst_mac");

        let mut occurrence =
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("timestamp"));
        if let Some(port) = event.get_i64("dport").and_then(|p| u16::try_from(p).ok()) {
            occurrence = occurrence.port(port);
        }
        if let Some(protocol) = event.get_string("protocol") {
            occurrence = occurrence.protocol(protocol);
        }
        src.connected_to.append(dst.key(), occurrence);

        Some((src, dst))
    }

    /// TCP/UDP: 연결 엣지만 기록합니다.
    fn connection(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        match self.endpoints(event) {
            Some((src, dst)) => Ok(vec![src.into(), dst.into()]),
            None => Ok(Vec::new()),
        }
    }

    /// HTTPRequest: 요청 도메인/URI를 추가합니다.
    fn http_request(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let Some((mut src, dst)) = self.endpoints(event) else {
            return Ok(Vec::new());
        };

        let mut domain = Domain::new(event.require_string("http_dest")?);
        let mut uri = Uri::new(event.require_string("uri")?);

        uri.uri_of.touch(domain.key());
        domain.resolves_to.touch(dst.key());

        let mut request =
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("timestamp"));
        if let Some(method) = event.get_string("http_method") {
            request = request.method(method);
        }
        src.http_request_to.append(uri.key(), request);

        Ok(vec![src.into(), dst.into(), domain.into(), uri.into()])
    }

    /// DNS: 조회 도메인과, 응답이 있으면 해석 IP를 추가합니다.
    fn dns(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let Some((mut src, dst)) = self.endpoints(event) else {
            return Ok(Vec::new());
        };

        // 질의 이름의 후행 점 제거 ("google.com." -> "google.com")
        let qname = event.require_string("qname")?;
        let mut domain = Domain::new(qname.trim_end_matches('.'));

        let mut query =
            EdgeOccurrence::new().timestamp_opt(event.get_timestamp("timestamp"));
        if let Some(record_type) = event.get_string("qtype") {
            query = query.value(record_type);
        }
        src.dns_query_for.append(domain.key(), query);

        if let Some(answer) = event.get_string("qanswer") {
            let addr = IpAddress::new(answer);
            domain.resolves_to.touch(addr.key());
            Ok(vec![src.into(), domain.into(), addr.into(), dst.into()])
        } else {
            Ok(vec![src.into(), domain.into(), dst.into()])
        }
    }
}

impl Transform for PcapTransformer {
    fn name(&self) -> &str {
        "pcap"
    }

    fn transform(&self, event: &Event) -> Result<Vec<Node>, TransformError> {
        let Some(event_type) = event.get_str("event_type") else {
            return Ok(Vec::new());
        };

        // IP/Ether 수준 레코드는 연결로서 의미가 없습니다.
        match event_type {
            "TCP" | "UDP" => self.connection(event),
            "HTTPRequest" => self.http_request(event),
            "DNS" => self.dns(event),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformer() -> PcapTransformer {
        PcapTransformer::new()
    }

    fn base_event(event_type: &str) -> Event {
        Event::new()
            .with("event_type", event_type)
            .with("src_ip", "127.0.0.1")
            .with("dst_ip", "192.168.1.1")
            .with("src_mac", "ab:ab:ab:ab:ab:ab")
            .with("dst_mac", "12:12:12:12:12:12")
            .with("protocol", "tcp")
            .with("sport", 12345)
            .with("dport", 80)
            .with("payload", "1")
            .with("timestamp", 1)
    }

    #[test]
    fn events_without_endpoints_are_noop() {
        let cases = [
            Event::new().with("event_type", "foobar"),
            Event::new().with("event_type", "TCP"),
            Event::new()
                .with("event_type", "foobar")
                .with("src_ip", "123.0.0.1"),
            Event::new()
                .with("event_type", "foobar")
                .with("dst_ip", "123.0.0.1"),
        ];
        for event in cases {
            assert!(transformer().transform(&event).unwrap().is_empty());
        }
    }

    #[test]
    fn ip_and_ether_levels_are_noop() {
        for event_type in ["IP", "Ether"] {
            let event = base_event(event_type);
            assert!(transformer().transform(&event).unwrap().is_empty());
        }
    }

    #[test]
    fn tcp_connection_yields_endpoint_pair() {
        let nodes = transformer().transform(&base_event("TCP")).unwrap();
        assert_eq!(nodes.len(), 2);

        let src = nodes[0].as_ip_address().unwrap();
        let dst = nodes[1].as_ip_address().unwrap();

        assert_eq!(src.ip_address.as_deref(), Some("127.0.0.1"));
        assert_eq!(dst.ip_address.as_deref(), Some("192.168.1.1"));
        assert_eq!(src.mac.as_deref(), Some("ab:ab:ab:ab:ab:ab"));
        assert_eq!(dst.mac.as_deref(), Some("12:12:12:12:12:12"));

        let occs = src.connected_to.occurrences(&dst.key()).unwrap();
        assert_eq!(occs[0].port, Some(80));
        assert_eq!(occs[0].protocol.as_deref(), Some("tcp"));
        assert_eq!(occs[0].timestamp, Some(1));
    }

    #[test]
    fn http_request_yields_domain_and_uri() {
        let event = base_event("HTTPRequest")
            .with("http_method", "GET")
            .with("uri", "/foo")
            .with("http_dest", "google.test");
        let nodes = transformer().transform(&event).unwrap();
        assert_eq!(nodes.len(), 4);

        let src = nodes[0].as_ip_address().unwrap();
        let dst = nodes[1].as_ip_address().unwrap();
        let domain = nodes[2].as_domain().unwrap();
        let uri = nodes[3].as_uri().unwrap();

        assert_eq!(uri.uri, "/foo");
        assert_eq!(domain.domain, "google.test");
        assert!(uri.uri_of.contains(&domain.key()));
        assert!(domain.resolves_to.contains(&dst.key()));
        assert!(src.connected_to.contains(&dst.key()));

        let reqs = src.http_request_to.occurrences(&uri.key()).unwrap();
        assert_eq!(reqs[0].method.as_deref(), Some("GET"));
    }

    #[test]
    fn dns_with_answer_yields_four_nodes() {
        let event = base_event("DNS")
            .with("protocol", "udp")
            .with("dport", 53)
            .with("qname", "google.test.")
            .with("qtype", "A")
            .with("qanswer", "123.0.0.1");
        let nodes = transformer().transform(&event).unwrap();
        assert_eq!(nodes.len(), 4);

        let src = nodes[0].as_ip_address().unwrap();
        let domain = nodes[1].as_domain().unwrap();
        let answer = nodes[2].as_ip_address().unwrap();
        let dst = nodes[3].as_ip_address().unwrap();

        // 후행 점이 제거됩니다.
        assert_eq!(domain.domain, "google.test");
        assert_eq!(answer.ip_address.as_deref(), Some("123.0.0.1"));
        assert!(domain.resolves_to.contains(&answer.key()));
        assert!(src.connected_to.contains(&dst.key()));

        let queries = src.dns_query_for.occurrences(&domain.key()).unwrap();
        assert_eq!(queries[0].value.as_deref(), Some("A"));
    }

    #[test]
    fn dns_without_answer_yields_three_nodes() {
        let event = base_event("DNS")
            .with("protocol", "udp")
            .with("dport", 53)
            .with("qname", "google.test.")
            .with("qtype", "A");
        let nodes = transformer().transform(&event).unwrap();
        assert_eq!(nodes.len(), 3);

        let src = nodes[0].as_ip_address().unwrap();
        let domain = nodes[1].as_domain().unwrap();
        assert!(src.dns_query_for.contains(&domain.key()));
    }

    #[test]
    fn dns_missing_qname_errors() {
        let event = base_event("DNS");
        assert!(transformer().transform(&event).is_err());
    }
}

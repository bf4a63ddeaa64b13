//! 그래프 싱크 구현
//!
//! 키 필드 기준 병합/렌더링을 수행하는 실제 그래프 백엔드는 외부
//! 협력자입니다. 이 모듈은 노드 목록을 그대로 수집하는
//! [`NodeListSink`]만 제공합니다 — 테스트와 라이브러리 소비자가
//! 인도(handoff) 계약을 검증하는 용도입니다.

use casegraph_core::error::CasegraphError;
use casegraph_core::node::Node;
use casegraph_core::pipeline::{GraphSink, SourceMetadata};

/// 노드 목록 수집 싱크
///
/// 전달받은 노드와 메타데이터를 보관만 합니다. 중복 제거를 하지
/// 않으므로 목록에는 같은 키의 노드가 여러 번 나타날 수 있습니다.
#[derive(Debug, Default)]
pub struct NodeListSink {
    nodes: Vec<Node>,
    metadata: SourceMetadata,
}

impl NodeListSink {
    /// 빈 싱크를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 수집된 노드 목록을 반환합니다.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// 소스 메타데이터를 반환합니다.
    pub fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    /// 수집된 노드를 소유권과 함께 꺼냅니다.
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}

impl GraphSink for NodeListSink {
    fn consume(
        &mut self,
        nodes: Vec<Node>,
        metadata: SourceMetadata,
    ) -> Result<(), CasegraphError> {
        tracing::debug!(nodes = nodes.len(), "sink received node list");
        self.nodes = nodes;
        self.metadata = metadata;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casegraph_core::node::Domain;

    #[test]
    fn consume_stores_nodes_and_metadata() {
        let mut sink = NodeListSink::new();
        let nodes: Vec<Node> = vec![Domain::new("a.test").into(), Domain::new("b.test").into()];
        let metadata = SourceMetadata::new().with("source", "unit");

        sink.consume(nodes, metadata).unwrap();

        assert_eq!(sink.nodes().len(), 2);
        assert_eq!(sink.metadata().get("source"), Some("unit"));
    }

    #[test]
    fn duplicate_keys_are_preserved() {
        let mut sink = NodeListSink::new();
        let nodes: Vec<Node> = vec![Domain::new("a.test").into(), Domain::new("a.test").into()];
        sink.consume(nodes, SourceMetadata::new()).unwrap();
        // 병합은 싱크 구현의 자유입니다. 이 싱크는 하지 않습니다.
        assert_eq!(sink.nodes().len(), 2);
    }
}

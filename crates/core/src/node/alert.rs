//! 알림 노드

use serde::Serialize;

use crate::edge::EdgeMap;
use crate::node::{GraphNode, NodeKey};

/// 알림 노드 — 키 필드는 {name}
///
/// 일부 소스는 "이 이벤트가 알림을 발생시켰다"를 래퍼 이벤트로
/// 표현합니다. transformer는 래핑된 이벤트를 재귀 변환한 뒤, 결과
/// 노드 전부에 alerted_on 엣지를 가진 Alert 노드를 앞에 붙입니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Alert {
    /// 알림 이름
    pub name: String,
    /// 알림 부가 데이터
    pub data: Option<String>,

    /// 이 알림이 가리키는 노드
    pub alerted_on: EdgeMap,
}

impl Alert {
    /// 이름으로 알림 노드를 생성합니다.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// 부가 데이터를 설정합니다.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }
}

impl GraphNode for Alert {
    fn node_type(&self) -> &'static str {
        "alert"
    }

    fn key(&self) -> NodeKey {
        NodeKey::new(self.node_type(), vec![self.name.clone()])
    }

    fn display(&self) -> String {
        self.name.clone()
    }

    fn edges(&self) -> Vec<(&'static str, &EdgeMap)> {
        vec![("alerted_on", &self.alerted_on)]
    }
}

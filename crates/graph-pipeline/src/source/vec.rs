//! 인메모리 데이터 소스

use casegraph_core::error::SourceError;
use casegraph_core::event::Event;
use casegraph_core::pipeline::{DataSource, EventStream, SourceMetadata};

/// 인메모리 이벤트 목록 소스
///
/// 준비된 이벤트 목록을 순서대로 내보냅니다. 테스트와, 이벤트를
/// 이미 메모리에 들고 있는 임베딩 환경에서 사용합니다.
pub struct VecSource {
    name: String,
    events: Option<Vec<Event>>,
}

impl VecSource {
    /// 이름과 이벤트 목록으로 소스를 생성합니다.
    pub fn new(name: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            name: name.into(),
            events: Some(events),
        }
    }
}

impl DataSource for VecSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn metadata(&self) -> SourceMetadata {
        SourceMetadata::new().with("source", self.name.clone())
    }

    fn events(&mut self) -> Result<EventStream, SourceError> {
        // 단일 패스: 두 번째 호출은 빈 시퀀스를 반환합니다.
        let events = self.events.take().unwrap_or_default();
        Ok(Box::new(events.into_iter().map(Ok)))
    }
}

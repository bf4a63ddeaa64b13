#![doc = include_str!("../README.md")]

pub mod config;
pub mod edge;
pub mod error;
pub mod event;
pub mod metrics;
pub mod node;
pub mod path;
pub mod pipeline;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{CasegraphError, ConfigError, PipelineError, SourceError, TransformError};

// 설정
pub use config::CasegraphConfig;

// 이벤트
pub use event::{Event, event_types, fields, hash_algos, protocols};

// 노드/엣지 모델
pub use edge::{EdgeMap, EdgeOccurrence};
pub use node::{
    Alert, Domain, File, GraphNode, IpAddress, Node, NodeKey, Process, RegistryKey, Uri,
};

// 확장 trait
pub use pipeline::{DataSource, EventStream, GraphSink, SourceMetadata, Transform};

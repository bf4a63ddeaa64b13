#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`pipeline`]: 생산자/소비자 실행 엔진 (GraphPipeline + 빌더)
//! - [`transform`]: 소스 형식별 transformer
//! - [`source`]: 데이터 소스 구현 (인메모리, JSON Lines 파일)
//! - [`sink`]: 노드 목록 수집 싱크
//! - [`config`]: 엔진 설정
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! DataSource -> producer -> mpsc -> worker pool -> Vec<Node> -> GraphSink
//!     |                                 |
//!  events() 반복                 Transform::transform
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod transform;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{GraphPipeline, GraphPipelineBuilder, RunReport, WorkerError};

// 설정
pub use config::EngineConfig;

// 에러
pub use error::GraphPipelineError;

// transformer
pub use transform::{
    DarpaTcTransformer, EvtxTransformer, FireEyeAxTransformer, FireEyeHxTransformer,
    GenericTransformer, PcapTransformer, ProcmonTransformer, SysmonTransformer,
};

// 데이터 소스
pub use source::{JsonlSource, VecSource};

// 싱크
pub use sink::NodeListSink;

//! 그래프 파이프라인 에러 타입
//!
//! [`GraphPipelineError`]는 엔진 조립/실행 단계의 에러를 표현합니다.
//! 이벤트 단위 변환 에러는 여기가 아니라
//! [`TransformError`](casegraph_core::error::TransformError)로 표현되어
//! 실행 보고서에 누적됩니다.

use casegraph_core::error::{CasegraphError, PipelineError};

/// 그래프 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum GraphPipelineError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 이벤트 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// 워커 태스크 join 실패
    #[error("worker join error: {0}")]
    WorkerJoin(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<GraphPipelineError> for CasegraphError {
    fn from(err: GraphPipelineError) -> Self {
        match err {
            GraphPipelineError::Io(e) => CasegraphError::Io(e),
            GraphPipelineError::Channel(msg) => {
                CasegraphError::Pipeline(PipelineError::ChannelSend(msg))
            }
            GraphPipelineError::WorkerJoin(msg) => {
                CasegraphError::Pipeline(PipelineError::WorkerJoin(msg))
            }
            other => CasegraphError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}

//! 엔진 설정
//!
//! [`EngineConfig`]는 core의
//! [`PipelineSettings`](casegraph_core::config::PipelineSettings)를
//! 기반으로 파이프라인 실행 설정을 제공합니다.

use serde::{Deserialize, Serialize};

use crate::error::GraphPipelineError;

/// 그래프 파이프라인 실행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 소비자 워커 수. 미지정 시 (가용 병렬도 - 1), 최소 1.
    pub workers: Option<usize>,
    /// 생산자→소비자 이벤트 채널 용량.
    /// 가득 차면 생산자가 블로킹되어 역압(backpressure)이 걸립니다.
    pub channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: None,
            channel_capacity: 1024,
        }
    }
}

impl EngineConfig {
    /// core 설정에서 엔진 설정을 생성합니다.
    pub fn from_core(core: &casegraph_core::config::PipelineSettings) -> Self {
        Self {
            workers: core.workers,
            channel_capacity: core.channel_capacity,
        }
    }

    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> Result<(), GraphPipelineError> {
        if self.channel_capacity == 0 {
            return Err(GraphPipelineError::Config {
                field: "channel_capacity".to_owned(),
                reason: "must be greater than zero".to_owned(),
            });
        }
        if self.workers == Some(0) {
            return Err(GraphPipelineError::Config {
                field: "workers".to_owned(),
                reason: "must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }

    /// 실제 사용할 워커 수를 계산합니다.
    ///
    /// 설정값이 없으면 (가용 병렬도 - 1), 최소 1. transformer가
    /// 제한(worker_limit)을 보고하면 그 값으로 상한을 겁니다.
    pub fn effective_workers(&self, transform_limit: Option<usize>) -> usize {
        let derived = self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1))
                .unwrap_or(1)
        });
        let derived = derived.max(1);
        match transform_limit {
            Some(limit) => derived.min(limit.max(1)),
            None => derived,
        }
    }
}

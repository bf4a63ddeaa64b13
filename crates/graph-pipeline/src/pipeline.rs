//! 파이프라인 엔진 -- 생산자/소비자 큐로 이벤트를 워커 풀에 분배합니다.
//!
//! [`GraphPipeline`]은 데이터 소스의 이벤트 시퀀스를 하나의 생산자
//! 태스크로 읽어 유계 mpsc 채널에 넣고, 고정 크기 소비자 풀이 꺼내
//! transformer를 호출합니다. 생성된 노드와 이벤트 단위 에러는 공유
//! 수집기에 쌓이고, 실행이 끝나면 [`RunReport`]로 반환됩니다.
//!
//! # 상태 흐름
//! ```text
//! Idle -> Running -> Draining -> Stopped
//! ```
//! 생산자가 시퀀스를 소진하면 송신측이 닫히고(원본 구현의 소비자별
//! 종료 센티널에 해당), 소비자들은 큐에 남은 이벤트를 모두 비운 뒤
//! 종료합니다.
//!
//! # 실패 의미론
//! - 이벤트 하나의 변환 실패는 워커 경계에서 잡혀 기록될 뿐 실행을
//!   중단시키지 않습니다. 모든 이벤트가 실패해도 실행은 성공이며
//!   노드 목록만 비어 있습니다.
//! - 소스 반복 에러는 생산자를 종료시키지만, 이미 큐에 들어간
//!   이벤트는 끝까지 처리되어 부분 결과가 반환됩니다.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use casegraph_core::error::{CasegraphError, SourceError, TransformError};
use casegraph_core::event::Event;
use casegraph_core::metrics as metric_names;
use casegraph_core::node::Node;
use casegraph_core::pipeline::{DataSource, GraphSink, Transform};

use crate::config::EngineConfig;
use crate::error::GraphPipelineError;

/// 이벤트 하나의 변환 실패 기록
#[derive(Debug)]
pub struct WorkerError {
    /// 실패를 기록한 워커 ID (0부터)
    pub worker: usize,
    /// 문제가 된 이벤트
    pub event: Event,
    /// 변환 에러
    pub error: TransformError,
}

/// 파이프라인 실행 결과
#[derive(Debug)]
pub struct RunReport {
    /// 실행 식별자 (UUID v4)
    pub run_id: String,
    /// 생성된 전체 노드 목록. 키 중복을 포함할 수 있으며 병합은
    /// 그래프 싱크의 책임입니다.
    pub nodes: Vec<Node>,
    /// 이벤트 단위 변환 에러 목록
    pub errors: Vec<WorkerError>,
    /// 소스 반복 중 발생한 치명 에러 (부분 결과와 함께 반환)
    pub source_error: Option<SourceError>,
    /// 소비자가 처리한 이벤트 수
    pub processed: u64,
}

impl RunReport {
    /// 에러 없이 완료되었는지 확인합니다.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.source_error.is_none()
    }
}

/// 그래프 파이프라인 -- 이벤트 수집/변환/노드 수집의 전체 흐름을 관리합니다.
///
/// # 사용 예시
/// ```ignore
/// use casegraph_pipeline::{GraphPipelineBuilder, GenericTransformer, VecSource};
///
/// let pipeline = GraphPipelineBuilder::new()
///     .source(Box::new(VecSource::new("demo", events)))
///     .transform(Arc::new(GenericTransformer::new()))
///     .build()?;
///
/// let report = pipeline.run().await?;
/// println!("created {} nodes", report.nodes.len());
/// ```
pub struct GraphPipeline {
    source: Box<dyn DataSource>,
    transform: Arc<dyn Transform>,
    config: EngineConfig,
    cancel: CancellationToken,
    run_id: String,
}

impl GraphPipeline {
    /// 실행 식별자를 반환합니다.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// 취소 토큰을 반환합니다.
    ///
    /// 토큰을 취소하면 생산자가 큐 투입을 멈추고, 이미 큐에 들어간
    /// 이벤트만 처리된 뒤 실행이 종료됩니다.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 파이프라인을 실행하고 노드 목록과 에러 로그를 반환합니다.
    pub async fn run(mut self) -> Result<RunReport, CasegraphError> {
        let format = self.transform.name().to_owned();
        tracing::debug!(run_id = %self.run_id, format = %format, "launching transformer");

        let stream = self.source.events().map_err(CasegraphError::Source)?;
        let workers = self
            .config
            .effective_workers(self.transform.worker_limit());

        tracing::debug!(workers, "starting consumer pool");

        let (event_tx, event_rx) = mpsc::channel::<Event>(self.config.channel_capacity);
        let event_rx = Arc::new(Mutex::new(event_rx));
        let nodes = Arc::new(Mutex::new(Vec::<Node>::new()));
        let errors = Arc::new(Mutex::new(Vec::<WorkerError>::new()));
        let source_error = Arc::new(Mutex::new(None::<SourceError>));

        // 생산자: 소스 시퀀스를 순회하며 채널에 투입
        let producer = {
            let cancel = self.cancel.clone();
            let source_error = Arc::clone(&source_error);
            tokio::spawn(async move {
                let mut sent = 0u64;
                for item in stream {
                    if cancel.is_cancelled() {
                        tracing::debug!(sent, "producer cancelled");
                        break;
                    }
                    match item {
                        Ok(event) => {
                            if event_tx.send(event).await.is_err() {
                                // 모든 소비자가 사라진 경우뿐이므로 종료
                                break;
                            }
                            metrics::counter!(metric_names::EVENTS_TOTAL).increment(1);
                            sent += 1;
                        }
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                "source iteration failed, draining queued events"
                            );
                            metrics::counter!(metric_names::SOURCE_ERRORS_TOTAL).increment(1);
                            *source_error.lock().await = Some(e);
                            break;
                        }
                    }
                }
                tracing::debug!(sent, "producer finished");
                sent
                // event_tx가 드롭되면서 채널이 닫히고 소비자 종료 신호가 됩니다.
            })
        };

        // 소비자 풀: 채널에서 꺼내 변환, 결과/에러 수집
        let mut worker_handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let event_rx = Arc::clone(&event_rx);
            let nodes = Arc::clone(&nodes);
            let errors = Arc::clone(&errors);
            let transform = Arc::clone(&self.transform);
            let format = format.clone();

            worker_handles.push(tokio::spawn(async move {
                let mut processed = 0u64;
                loop {
                    let maybe_event = { event_rx.lock().await.recv().await };
                    let Some(event) = maybe_event else {
                        tracing::debug!(worker = worker_id, processed, "consumer finished");
                        break;
                    };
                    processed += 1;

                    match transform.transform(&event) {
                        Ok(new_nodes) => {
                            if !new_nodes.is_empty() {
                                metrics::counter!(
                                    metric_names::NODES_TOTAL,
                                    metric_names::LABEL_FORMAT => format.clone()
                                )
                                .increment(new_nodes.len() as u64);
                                nodes.lock().await.extend(new_nodes);
                            }
                        }
                        Err(error) => {
                            tracing::warn!(
                                worker = worker_id,
                                error = %error,
                                "error when transforming event"
                            );
                            tracing::debug!(worker = worker_id, event = ?event);
                            metrics::counter!(metric_names::TRANSFORM_ERRORS_TOTAL).increment(1);
                            errors.lock().await.push(WorkerError {
                                worker: worker_id,
                                event,
                                error,
                            });
                        }
                    }
                }
                processed
            }));
        }

        // 생산자 종료 대기 후 소비자들이 큐를 비울 때까지 대기
        producer
            .await
            .map_err(|e| GraphPipelineError::WorkerJoin(e.to_string()))
            .map_err(CasegraphError::from)?;

        let mut processed = 0u64;
        for handle in worker_handles {
            processed += handle
                .await
                .map_err(|e| GraphPipelineError::WorkerJoin(e.to_string()))
                .map_err(CasegraphError::from)?;
        }

        let nodes = {
            let mut guard = nodes.lock().await;
            std::mem::take(&mut *guard)
        };
        let errors = {
            let mut guard = errors.lock().await;
            std::mem::take(&mut *guard)
        };
        let source_error = {
            let mut guard = source_error.lock().await;
            guard.take()
        };

        metrics::counter!(metric_names::RUNS_TOTAL).increment(1);
        tracing::info!(
            run_id = %self.run_id,
            nodes = nodes.len(),
            processed,
            "finished processing of events"
        );
        if !errors.is_empty() || source_error.is_some() {
            tracing::warn!(
                event_errors = errors.len(),
                source_error = source_error.is_some(),
                "run finished with errors"
            );
        }

        Ok(RunReport {
            run_id: self.run_id,
            nodes,
            errors,
            source_error,
            processed,
        })
    }

    /// 파이프라인을 실행하고 결과를 그래프 싱크에 전달합니다.
    ///
    /// 싱크에는 노드 목록과 소스 메타데이터가 함께 넘어갑니다.
    /// 반환값은 실행 보고서입니다 (노드 목록은 싱크로 이동).
    pub async fn to_graph<S: GraphSink>(
        self,
        sink: &mut S,
    ) -> Result<RunReport, CasegraphError> {
        let metadata = self.source.metadata();
        let mut report = self.run().await?;
        let nodes = std::mem::take(&mut report.nodes);
        sink.consume(nodes, metadata)?;
        Ok(report)
    }
}

/// 그래프 파이프라인 빌더
///
/// 데이터 소스와 transformer를 조립하고 설정을 검증합니다.
pub struct GraphPipelineBuilder {
    source: Option<Box<dyn DataSource>>,
    transform: Option<Arc<dyn Transform>>,
    config: EngineConfig,
    cancel: Option<CancellationToken>,
}

impl GraphPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            source: None,
            transform: None,
            config: EngineConfig::default(),
            cancel: None,
        }
    }

    /// 데이터 소스를 설정합니다 (필수).
    pub fn source(mut self, source: Box<dyn DataSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// transformer를 설정합니다 (필수).
    pub fn transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// 엔진 설정을 지정합니다.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// 외부 취소 토큰을 연결합니다.
    ///
    /// 설정하지 않으면 빌더가 새 토큰을 생성합니다.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// 파이프라인을 빌드합니다.
    pub fn build(self) -> Result<GraphPipeline, GraphPipelineError> {
        self.config.validate()?;

        let source = self.source.ok_or_else(|| GraphPipelineError::Config {
            field: "source".to_owned(),
            reason: "data source is required".to_owned(),
        })?;
        let transform = self.transform.ok_or_else(|| GraphPipelineError::Config {
            field: "transform".to_owned(),
            reason: "transformer is required".to_owned(),
        })?;

        Ok(GraphPipeline {
            source,
            transform,
            config: self.config,
            cancel: self.cancel.unwrap_or_default(),
            run_id: uuid::Uuid::new_v4().to_string(),
        })
    }
}

impl Default for GraphPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

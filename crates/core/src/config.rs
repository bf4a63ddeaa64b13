//! 설정 관리 — casegraph.toml 파싱 및 런타임 설정
//!
//! [`CasegraphConfig`]는 라이브러리를 임베딩하는 쪽이 전달하는
//! 최상위 설정 구조체입니다. 각 섹션은 해당 크레이트만 읽어 사용합니다.
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), casegraph_core::error::CasegraphError> {
//! use casegraph_core::config::CasegraphConfig;
//!
//! // 파일에서 로드
//! let config = CasegraphConfig::load("casegraph.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = CasegraphConfig::parse("[pipeline]\nchannel_capacity = 512")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CasegraphError, ConfigError};

/// casegraph 통합 설정
///
/// `casegraph.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CasegraphConfig {
    /// 파이프라인 설정
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

/// 파이프라인 실행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// 소비자 워커 수. 미지정 시 (가용 병렬도 - 1), 최소 1.
    pub workers: Option<usize>,
    /// 생산자→소비자 이벤트 채널 용량
    pub channel_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: None,
            channel_capacity: 1024,
        }
    }
}

impl CasegraphConfig {
    /// TOML 파일에서 설정을 로드하고 검증합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CasegraphError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CasegraphError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                CasegraphError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, CasegraphError> {
        toml::from_str(toml_str).map_err(|e| {
            CasegraphError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.channel_capacity".to_owned(),
                reason: "must be greater than zero".to_owned(),
            });
        }
        if self.pipeline.workers == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.workers".to_owned(),
                reason: "must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = CasegraphConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.channel_capacity, 1024);
        assert_eq!(config.pipeline.workers, None);
    }

    #[test]
    fn parse_pipeline_section() {
        let config =
            CasegraphConfig::parse("[pipeline]\nworkers = 4\nchannel_capacity = 256").unwrap();
        assert_eq!(config.pipeline.workers, Some(4));
        assert_eq!(config.pipeline.channel_capacity, 256);
    }

    #[test]
    fn parse_empty_uses_defaults() {
        let config = CasegraphConfig::parse("").unwrap();
        assert_eq!(config.pipeline.channel_capacity, 1024);
    }

    #[test]
    fn zero_capacity_rejected() {
        let config = CasegraphConfig::parse("[pipeline]\nchannel_capacity = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_workers_rejected() {
        let config = CasegraphConfig::parse("[pipeline]\nworkers = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_toml_fails() {
        assert!(CasegraphConfig::parse("not [toml").is_err());
    }

    #[tokio::test]
    async fn load_missing_file_is_not_found() {
        let err = CasegraphConfig::load("/nonexistent/casegraph.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CasegraphError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}

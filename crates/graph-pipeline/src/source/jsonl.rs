//! JSON Lines 파일 데이터 소스

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use casegraph_core::error::SourceError;
use casegraph_core::event::Event;
use casegraph_core::pipeline::{DataSource, EventStream, SourceMetadata};

/// JSON Lines 파일 소스
///
/// 한 줄에 이벤트 객체 하나가 있는 파일을 지연 읽기로 내보냅니다.
/// 빈 줄은 건너뜁니다. 잘못된 JSON이나 객체가 아닌 줄은
/// [`SourceError::Decode`]로 반복을 중단시킵니다 — 파이프라인은
/// 그 시점까지 큐에 들어간 이벤트로 부분 결과를 반환합니다.
pub struct JsonlSource {
    path: PathBuf,
}

impl JsonlSource {
    /// 파일 경로로 소스를 생성합니다.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 읽을 파일 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for JsonlSource {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn metadata(&self) -> SourceMetadata {
        SourceMetadata::new()
            .with("source", "jsonl")
            .with("path", self.path.display().to_string())
    }

    fn events(&mut self) -> Result<EventStream, SourceError> {
        let file = fs::File::open(&self.path)?;
        let mut lines = BufReader::new(file).lines().enumerate();

        Ok(Box::new(std::iter::from_fn(move || {
            loop {
                let (record, line) = match lines.next() {
                    Some((record, Ok(line))) => (record, line),
                    Some((_, Err(e))) => return Some(Err(SourceError::Io(e))),
                    None => return None,
                };

                if line.trim().is_empty() {
                    continue;
                }

                let value: serde_json::Value = match serde_json::from_str(&line) {
                    Ok(value) => value,
                    Err(e) => {
                        return Some(Err(SourceError::Decode {
                            record,
                            reason: e.to_string(),
                        }));
                    }
                };

                return match Event::from_value(value) {
                    Ok(event) => Some(Ok(event)),
                    Err(e) => Some(Err(SourceError::Decode {
                        record,
                        reason: e.to_string(),
                    })),
                };
            }
        })))
    }
}

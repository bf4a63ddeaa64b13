//! 이벤트 매핑 — 소스 형식별 원시 레코드의 공통 표현
//!
//! [`Event`]는 소스마다 필드명이 다른 불투명한 JSON 객체 매핑입니다.
//! transformer는 이 매핑을 읽기만 하며, 선택 필드는 `get_*` 계열로,
//! 필수 필드는 `require_*` 계열로 접근합니다. 필수 필드가 없으면
//! [`TransformError`]가 반환되고 파이프라인이 이벤트 단위로 기록합니다.
//!
//! 정규화 스키마(generic transformer)의 필드명/이벤트 타입 상수도
//! 이 모듈에서 중앙 정의합니다.

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use crate::error::TransformError;

/// 이벤트 내부 매핑 타입
pub type EventMap = serde_json::Map<String, Value>;

// --- 정규화 스키마 필드명 상수 ---

/// 정규화 스키마의 필드명
///
/// 스키마를 따르는 데이터 소스는 아래 이름으로 필드를 내보내고,
/// generic transformer가 이를 그대로 소비합니다.
pub mod fields {
    /// 이벤트 타입 판별자
    pub const EVENT_TYPE: &str = "event_type";
    /// 이벤트 발생 시각 (epoch 초 또는 문자열)
    pub const TIMESTAMP: &str = "timestamp";

    /// 프로세스 이미지명 (예: "cmd.exe")
    pub const PROCESS_IMAGE: &str = "process_image";
    /// 프로세스 이미지 디렉토리 경로
    pub const PROCESS_IMAGE_PATH: &str = "process_image_path";
    /// 프로세스 ID
    pub const PROCESS_ID: &str = "process_id";
    /// 커맨드라인
    pub const COMMAND_LINE: &str = "command_line";

    /// 부모 프로세스 이미지명
    pub const PARENT_PROCESS_IMAGE: &str = "parent_process_image";
    /// 부모 프로세스 이미지 디렉토리 경로
    pub const PARENT_PROCESS_IMAGE_PATH: &str = "parent_process_image_path";
    /// 부모 프로세스 ID
    pub const PARENT_PROCESS_ID: &str = "parent_process_id";
    /// 부모 커맨드라인
    pub const PARENT_COMMAND_LINE: &str = "parent_command_line";

    /// 파일명
    pub const FILE_NAME: &str = "file_name";
    /// 파일 디렉토리 경로
    pub const FILE_PATH: &str = "file_path";
    /// 복사/이동 원본 파일 (중첩 객체)
    pub const SRC_FILE: &str = "src_file";
    /// 복사/이동 대상 파일 (중첩 객체)
    pub const DEST_FILE: &str = "dest_file";
    /// 해시 맵 (md5/sha1/sha256)
    pub const HASHES: &str = "hashes";

    /// IP 주소
    pub const IP_ADDRESS: &str = "ip_address";
    /// 포트
    pub const PORT: &str = "port";
    /// 프로토콜
    pub const PROTOCOL: &str = "protocol";
    /// HTTP 호스트 (도메인)
    pub const HTTP_HOST: &str = "http_host";
    /// HTTP 메서드
    pub const HTTP_METHOD: &str = "http_method";
    /// 요청 URI
    pub const URI: &str = "uri";

    /// 레지스트리 하이브
    pub const HIVE: &str = "hive";
    /// 레지스트리 키
    pub const REG_KEY: &str = "reg_key";
    /// 레지스트리 키 경로
    pub const REG_KEY_PATH: &str = "reg_key_path";
    /// 레지스트리 값
    pub const REG_KEY_VALUE: &str = "reg_key_value";

    /// 알림 래핑 여부 플래그
    pub const ALERTED_ON: &str = "alerted_on";
    /// 알림 이름
    pub const ALERT_NAME: &str = "alert_name";
    /// 알림 부가 데이터
    pub const ALERT_DATA: &str = "alert_data";
}

// --- 정규화 스키마 이벤트 타입 상수 ---

/// 정규화 스키마의 이벤트 타입 값
pub mod event_types {
    /// 프로세스 생성
    pub const PROCESS_LAUNCHED: &str = "process_launched";
    /// 파일 열람
    pub const FILE_OPENED: &str = "file_opened";
    /// 파일 쓰기
    pub const FILE_WRITTEN: &str = "file_written";
    /// 파일 삭제
    pub const FILE_DELETED: &str = "file_deleted";
    /// 파일 복사 (원본+대상 동시 보고)
    pub const FILE_COPIED: &str = "file_copied";
    /// 모듈(DLL) 로드
    pub const LOADED_MODULE: &str = "loaded_module";
    /// 네트워크 연결
    pub const CONNECTION: &str = "connection";
    /// HTTP 요청
    pub const HTTP_REQUEST: &str = "http_request";
    /// DNS 조회
    pub const DNS_LOOKUP: &str = "dns_lookup";
    /// 레지스트리 키 열람
    pub const REG_KEY_OPENED: &str = "reg_key_opened";
    /// 레지스트리 키 삭제
    pub const REG_KEY_DELETED: &str = "reg_key_deleted";
    /// 레지스트리 값 설정
    pub const REG_KEY_SET: &str = "reg_key_set";
}

/// 해시 알고리즘 키
pub mod hash_algos {
    /// MD5
    pub const MD5: &str = "md5";
    /// SHA-1
    pub const SHA1: &str = "sha1";
    /// SHA-256
    pub const SHA256: &str = "sha256";
}

/// 프로토콜 이름
pub mod protocols {
    /// TCP
    pub const TCP: &str = "tcp";
    /// UDP
    pub const UDP: &str = "udp";
    /// HTTP
    pub const HTTP: &str = "http";
}

/// 원시 이벤트 — 소스 형식별 필드를 담는 불투명 매핑
///
/// transformer는 이벤트를 변경하지 않으며(알림 래핑 시에는 복제본을
/// 사용), 필드 접근은 전부 방어적으로 수행합니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Event {
    fields: EventMap,
}

impl Event {
    /// 빈 이벤트를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON 객체 매핑에서 이벤트를 생성합니다.
    pub fn from_map(fields: EventMap) -> Self {
        Self { fields }
    }

    /// 임의의 JSON 값에서 이벤트를 생성합니다.
    ///
    /// 최상위가 객체가 아니면 [`TransformError::Malformed`]를 반환합니다.
    pub fn from_value(value: Value) -> Result<Self, TransformError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(TransformError::Malformed(format!(
                "expected JSON object, got {other}"
            ))),
        }
    }

    /// 필드를 설정한 이벤트를 반환합니다 (테스트/소스 빌더용).
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_owned(), value.into());
        self
    }

    /// 필드를 설정합니다.
    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_owned(), value.into());
    }

    /// 필드를 제거하고 값을 반환합니다.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// 필드 존재 여부를 확인합니다.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// 원시 값을 반환합니다.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// 내부 매핑에 대한 참조를 반환합니다.
    pub fn as_map(&self) -> &EventMap {
        &self.fields
    }

    /// 문자열 필드를 반환합니다. 문자열이 아니면 None.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// 문자열로 강제 변환한 필드를 반환합니다.
    ///
    /// 숫자/불리언 값도 문자열로 변환합니다. 소스마다 같은 필드를
    /// 문자열 또는 숫자로 내보내는 경우가 흔하기 때문입니다.
    pub fn get_string(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// 정수 필드를 반환합니다. 숫자 문자열("3144")도 허용합니다.
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        match self.fields.get(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// 불리언 필드를 반환합니다.
    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }

    /// 중첩 객체 필드를 반환합니다.
    pub fn get_map(&self, field: &str) -> Option<&EventMap> {
        self.fields.get(field).and_then(Value::as_object)
    }

    /// 필수 문자열 필드를 반환합니다.
    pub fn require_str(&self, field: &str) -> Result<&str, TransformError> {
        self.get(field)
            .ok_or_else(|| TransformError::missing(field))?
            .as_str()
            .ok_or_else(|| TransformError::invalid(field, "expected string"))
    }

    /// 필수 문자열 필드를 소유값으로 반환합니다 (숫자/불리언 변환 포함).
    pub fn require_string(&self, field: &str) -> Result<String, TransformError> {
        if !self.contains(field) {
            return Err(TransformError::missing(field));
        }
        self.get_string(field)
            .ok_or_else(|| TransformError::invalid(field, "expected string-like value"))
    }

    /// 필수 정수 필드를 반환합니다. 숫자 문자열도 허용합니다.
    pub fn require_i64(&self, field: &str) -> Result<i64, TransformError> {
        if !self.contains(field) {
            return Err(TransformError::missing(field));
        }
        self.get_i64(field)
            .ok_or_else(|| TransformError::invalid(field, "expected integer"))
    }

    /// 필수 중첩 객체 필드를 반환합니다.
    pub fn require_map(&self, field: &str) -> Result<&EventMap, TransformError> {
        self.get(field)
            .ok_or_else(|| TransformError::missing(field))?
            .as_object()
            .ok_or_else(|| TransformError::invalid(field, "expected object"))
    }

    /// 타임스탬프 필드를 epoch 초로 반환합니다.
    ///
    /// 지원 형식: 정수(epoch 초), RFC 3339 문자열,
    /// `YYYY-MM-DD HH:MM:SS.fff` 형식 (Sysmon UtcTime).
    pub fn get_timestamp(&self, field: &str) -> Option<i64> {
        coerce_timestamp(self.fields.get(field)?)
    }

    /// 필수 타임스탬프 필드를 epoch 초로 반환합니다.
    pub fn require_timestamp(&self, field: &str) -> Result<i64, TransformError> {
        if !self.contains(field) {
            return Err(TransformError::missing(field));
        }
        self.get_timestamp(field)
            .ok_or_else(|| TransformError::invalid(field, "unrecognized timestamp format"))
    }
}

/// JSON 값을 epoch 초 타임스탬프로 변환합니다.
pub fn coerce_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

/// 타임스탬프 문자열을 epoch 초로 파싱합니다.
fn parse_timestamp_str(s: &str) -> Option<i64> {
    let s = s.trim();

    if let Ok(epoch) = s.parse::<i64>() {
        return Some(epoch);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }

    // Sysmon UtcTime: "2019-07-18 09:32:13.144"
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc().timestamp());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_event() -> Event {
        Event::new()
            .with(fields::EVENT_TYPE, event_types::PROCESS_LAUNCHED)
            .with(fields::PROCESS_ID, "3144")
            .with(fields::PORT, 443)
            .with(fields::TIMESTAMP, 1000)
    }

    #[test]
    fn get_str_returns_strings_only() {
        let event = sample_event();
        assert_eq!(
            event.get_str(fields::EVENT_TYPE),
            Some(event_types::PROCESS_LAUNCHED)
        );
        assert_eq!(event.get_str(fields::PORT), None);
    }

    #[test]
    fn get_string_coerces_numbers() {
        let event = sample_event();
        assert_eq!(event.get_string(fields::PORT), Some("443".to_owned()));
    }

    #[test]
    fn get_i64_accepts_numeric_strings() {
        let event = sample_event();
        assert_eq!(event.get_i64(fields::PROCESS_ID), Some(3144));
        assert_eq!(event.get_i64(fields::PORT), Some(443));
        assert_eq!(event.get_i64("nonexistent"), None);
    }

    #[test]
    fn require_missing_field_errors() {
        let event = sample_event();
        let err = event.require_str("no_such_field").unwrap_err();
        assert!(matches!(err, TransformError::MissingField { .. }));
    }

    #[test]
    fn require_i64_rejects_non_numeric() {
        let event = Event::new().with("pid", "not-a-number");
        let err = event.require_i64("pid").unwrap_err();
        assert!(matches!(err, TransformError::InvalidField { .. }));
    }

    #[test]
    fn from_value_rejects_non_object() {
        let result = Event::from_value(json!(["a", "b"]));
        assert!(result.is_err());
    }

    #[test]
    fn remove_deletes_field() {
        let mut event = sample_event();
        assert!(event.remove(fields::TIMESTAMP).is_some());
        assert!(!event.contains(fields::TIMESTAMP));
    }

    #[test]
    fn nested_map_access() {
        let event = Event::new().with(
            fields::SRC_FILE,
            json!({fields::FILE_NAME: "a.txt", fields::FILE_PATH: "C:\\Temp"}),
        );
        let src = event.require_map(fields::SRC_FILE).unwrap();
        assert_eq!(src.get(fields::FILE_NAME).unwrap(), "a.txt");
    }

    #[test]
    fn timestamp_from_integer() {
        let event = sample_event();
        assert_eq!(event.get_timestamp(fields::TIMESTAMP), Some(1000));
    }

    #[test]
    fn timestamp_from_rfc3339() {
        let event = Event::new().with(fields::TIMESTAMP, "1970-01-01T00:16:40Z");
        assert_eq!(event.get_timestamp(fields::TIMESTAMP), Some(1000));
    }

    #[test]
    fn timestamp_from_sysmon_utc_time() {
        let event = Event::new().with("utc_time", "2019-07-18 09:32:13.144");
        let ts = event.get_timestamp("utc_time").unwrap();
        assert!(ts > 1_500_000_000);
    }

    #[test]
    fn timestamp_from_numeric_string() {
        let event = Event::new().with(fields::TIMESTAMP, "1000");
        assert_eq!(event.get_timestamp(fields::TIMESTAMP), Some(1000));
    }

    #[test]
    fn timestamp_unrecognized_returns_none() {
        let event = Event::new().with(fields::TIMESTAMP, "yesterday");
        assert_eq!(event.get_timestamp(fields::TIMESTAMP), None);
        assert!(event.require_timestamp(fields::TIMESTAMP).is_err());
    }
}

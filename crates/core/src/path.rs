//! 경로 분해 유틸리티 — 파일시스템/레지스트리 경로 공통 파싱
//!
//! 여러 소스 형식이 전체 경로 하나를 (이름, 디렉토리) 또는
//! (하이브, 키, 키 경로)로 분해해야 합니다. 형식마다 구분자 방향이
//! 다르고(슬래시/역슬래시), 디렉토리 성분이 없는 경로와 하이브 마커가
//! 붙은 레지스트리 경로도 흔하므로, 분해 로직을 transformer마다
//! 중복하지 않고 여기에서 공유합니다.

/// 전체 경로를 (이름, 디렉토리)로 분해합니다.
///
/// 구분자 판별 규칙:
/// - 역슬래시를 포함하거나 드라이브 문자(`C:`)로 시작하면 Windows
///   경로로 보고, 잘못 섞인 슬래시를 역슬래시로 정규화한 뒤 분해
/// - 그 외에 슬래시를 포함하면 POSIX 경로로 분해
/// - 구분자가 전혀 없으면 디렉토리는 `"\\"`
///
/// ```
/// use casegraph_core::path::split_path;
///
/// assert_eq!(
///     split_path("C:\\Windows\\cmd.exe"),
///     ("cmd.exe".to_owned(), "C:\\Windows".to_owned())
/// );
/// assert_eq!(
///     split_path("/usr/bin/ls"),
///     ("ls".to_owned(), "/usr/bin".to_owned())
/// );
/// ```
pub fn split_path(path: &str) -> (String, String) {
    if is_windows_style(path) {
        let normalized = path.replace('/', "\\");
        match normalized.rsplit_once('\\') {
            Some((dir, name)) => {
                let dir = if dir.is_empty() { "\\" } else { dir };
                (name.to_owned(), dir.to_owned())
            }
            None => (normalized, "\\".to_owned()),
        }
    } else if let Some((dir, name)) = path.rsplit_once('/') {
        let dir = if dir.is_empty() { "/" } else { dir };
        (name.to_owned(), dir.to_owned())
    } else {
        (path.to_owned(), "\\".to_owned())
    }
}

/// (디렉토리, 이름)을 경로로 결합합니다. `split_path`의 역연산입니다.
pub fn join_path(directory: &str, name: &str) -> String {
    let sep = if directory.contains('/') && !directory.contains('\\') {
        '/'
    } else {
        '\\'
    };
    if directory.ends_with(sep) {
        format!("{directory}{name}")
    } else {
        format!("{directory}{sep}{name}")
    }
}

/// 레지스트리 경로를 (하이브, 키, 키 경로)로 분해합니다.
///
/// 선행 역슬래시와 `REGISTRY\` 마커는 제거합니다. 경로 성분이 하나뿐이면
/// 하이브와 키가 같은 값이 되고 키 경로는 빈 문자열입니다.
///
/// ```
/// use casegraph_core::path::split_reg_path;
///
/// assert_eq!(
///     split_reg_path("\\REGISTRY\\USER\\Software\\Microsoft\\Run"),
///     ("USER".to_owned(), "Run".to_owned(), "Software\\Microsoft".to_owned())
/// );
/// ```
pub fn split_reg_path(reg_path: &str) -> (String, String, String) {
    let mut path = reg_path.trim_start_matches('\\');
    if let Some(rest) = path.strip_prefix("REGISTRY\\") {
        path = rest;
    }

    let parts: Vec<&str> = path.split('\\').collect();
    let hive = parts.first().copied().unwrap_or_default().to_owned();
    let key = parts.last().copied().unwrap_or_default().to_owned();
    let key_path = if parts.len() > 2 {
        parts[1..parts.len() - 1].join("\\")
    } else {
        String::new()
    };

    (hive, key, key_path)
}

fn is_windows_style(path: &str) -> bool {
    path.contains('\\') || path.as_bytes().get(1) == Some(&b':')
}

//! 에러 타입: 도메인별 에러 정의

/// sbomrelay 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SbomRelayError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 형식 분류 / 처리 에러
    #[error("classify error: {0}")]
    Classify(#[from] ClassifyError),

    /// 입력/출력 어댑터 에러
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterFailure),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 레코드 단위 분류/처리 에러
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// 빈 입력
    #[error("empty content: {0}")]
    EmptyContent(String),

    /// 알 수 없는 형식
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    /// 주 컴포넌트를 찾지 못함
    #[error("primary component not found")]
    PrimaryNotFound,

    /// 기타 처리 실패 (출력 쓰기, pretty-print 등)
    #[error("{0}")]
    Failed(String),
}

/// 어댑터 수준 에러
#[derive(Debug, thiserror::Error)]
pub enum AdapterFailure {
    /// 플래그 누락/오용
    #[error("invalid flags: {0}")]
    Flags(String),

    /// 입력 소스를 사용할 수 없음 (버킷 없음, 루트 열기 실패 등)
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// 분류를 통과한 SBOM이 하나도 없음
    #[error("no sboms found: {0}")]
    NoSbomsFound(String),

    /// 취소됨
    #[error("cancelled")]
    Cancelled,

    /// 기타 전송 실패
    #[error("transfer failed: {0}")]
    Transfer(String),
}

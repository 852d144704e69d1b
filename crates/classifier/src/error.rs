//! 분류기 에러 타입
//!
//! [`ClassifierError`]는 레코드 단위 에러입니다. 호출자는 보통 로그를 남기고 해당 레코드만 건너뜁니다.
//! `From<ClassifierError> for SbomRelayError` 구현으로 `?` 전파가 가능합니다.

use sbomrelay_core::error::{ClassifyError, SbomRelayError};

/// 분류기 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// 빈 입력
    #[error("empty content: {path}")]
    EmptyContent {
        /// 레코드 경로
        path: String,
    },

    /// 어떤 probe에도 맞지 않음
    #[error("unknown format: {path}")]
    UnknownFormat {
        /// 레코드 경로
        path: String,
    },

    /// 주 컴포넌트를 찾지 못함
    #[error("primary component not found")]
    PrimaryNotFound,

    /// pretty-print 대상이 JSON이 아님
    #[error("pretty print parse failure: {0}")]
    PrettyPrint(String),

    /// 출력 파일 이름으로 쓸 수 없는 저장소 이름
    #[error("invalid output name: '{0}'")]
    InvalidOutputName(String),

    /// 출력 쓰기 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl From<ClassifierError> for SbomRelayError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::EmptyContent { path } => {
                SbomRelayError::Classify(ClassifyError::EmptyContent(path))
            }
            ClassifierError::UnknownFormat { path } => {
                SbomRelayError::Classify(ClassifyError::UnknownFormat(path))
            }
            ClassifierError::PrimaryNotFound => {
                SbomRelayError::Classify(ClassifyError::PrimaryNotFound)
            }
            other => SbomRelayError::Classify(ClassifyError::Failed(other.to_string())),
        }
    }
}

//! 어댑터 에러 타입
//!
//! [`AdapterError`]는 플래그 검증부터 전송 완료까지 어댑터 계층의 모든 에러를 나타냅니다.
//! `From<AdapterError> for SbomRelayError` 구현으로 상위 에러로 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **설정/플래그**: `MissingFlags`, `InvalidFlagUsage`, `InvalidValue` (I/O 전에 실패)
//! - **소스 치명적**: `BucketMissing`, `BucketAccessDenied`, `RootUnreadable`, `NoSbomsFound`
//! - **레코드 단위**: `Io`, `Classifier` (보통 로그 후 건너뜀)
//! - **흐름 제어**: `Cancelled`, `Terminated`, `Aggregate`

use sbomrelay_classifier::ClassifierError;
use sbomrelay_core::error::{AdapterFailure, SbomRelayError};
use sbomrelay_core::types::AdapterRole;

/// 어댑터 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// 필수 플래그 누락
    #[error("missing required flags: {}", .0.join(", "))]
    MissingFlags(Vec<String>),

    /// 역할 접두사는 맞지만 다른 어댑터 종류의 플래그
    #[error("invalid {role} adapter flag usage: {}", .flags.join(", "))]
    InvalidFlagUsage {
        /// 어댑터 역할
        role: AdapterRole,
        /// 잘못 사용된 플래그
        flags: Vec<String>,
    },

    /// 플래그 값이 유효하지 않음
    #[error("invalid value for {flag}: {reason}")]
    InvalidValue {
        /// 플래그 이름
        flag: String,
        /// 사유
        reason: String,
    },

    /// 버킷이 존재하지 않음
    #[error("bucket '{bucket}' does not exist")]
    BucketMissing {
        /// 버킷 이름
        bucket: String,
    },

    /// 버킷 접근 거부
    #[error("access denied to bucket '{bucket}'")]
    BucketAccessDenied {
        /// 버킷 이름
        bucket: String,
    },

    /// 분류를 통과한 SBOM이 하나도 없음
    #[error("no sboms found at {location}")]
    NoSbomsFound {
        /// 조회한 위치 (예: `s3://bucket/prefix/`)
        location: String,
    },

    /// 입력 루트 디렉토리를 열 수 없음
    #[error("cannot open root {path}: {source}")]
    RootUnreadable {
        /// 루트 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 파일 시스템 감시 에러
    #[error("watch error: {path}: {reason}")]
    Watch {
        /// 감시 경로
        path: String,
        /// 사유
        reason: String,
    },

    /// 레코드 단위 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 오브젝트 스토어 호출 실패
    #[error("object store {operation} failed: {reason}")]
    ObjectStore {
        /// 호출한 연산 (head_bucket, list_objects, get_object, put_object)
        operation: &'static str,
        /// 사유
        reason: String,
    },

    /// 분류/처리 에러
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    /// 리포트 출력 실패
    #[error("report output error: {0}")]
    Report(#[source] std::io::Error),

    /// 백그라운드 생산자 태스크 실패
    #[error("producer task failed: {0}")]
    Producer(String),

    /// 역할에 맞지 않는 연산
    #[error("{adapter} {role} adapter does not support {operation}")]
    UnsupportedOperation {
        /// 어댑터 이름
        adapter: &'static str,
        /// 어댑터 역할
        role: AdapterRole,
        /// 연산 이름
        operation: &'static str,
    },

    /// 여러 레코드가 실패함 (첫 원인 포함)
    #[error("{count} record(s) failed, first: {first}")]
    Aggregate {
        /// 실패한 레코드 수
        count: usize,
        /// 첫 번째 실패 원인
        #[source]
        first: Box<AdapterError>,
    },

    /// 이전 호출에서 이미 실패한 이터레이터
    #[error("iterator terminated: {0}")]
    Terminated(String),

    /// 취소됨
    #[error("cancelled")]
    Cancelled,
}

impl AdapterError {
    /// 레코드 단위 실패들을 하나의 에러로 묶습니다. 비어 있으면 `None`입니다.
    pub fn aggregate(mut failures: Vec<AdapterError>) -> Option<AdapterError> {
        if failures.is_empty() {
            return None;
        }
        let count = failures.len();
        let first = failures.swap_remove(0);
        Some(AdapterError::Aggregate {
            count,
            first: Box::new(first),
        })
    }

    /// 플래그/설정 단계 에러인지
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::MissingFlags(_) | Self::InvalidFlagUsage { .. } | Self::InvalidValue { .. }
        )
    }

    /// 입력 소스를 쓸 수 없는 에러인지
    pub fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            Self::BucketMissing { .. }
                | Self::BucketAccessDenied { .. }
                | Self::RootUnreadable { .. }
                | Self::Watch { .. }
        )
    }
}

impl From<AdapterError> for SbomRelayError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Classifier(e) => e.into(),
            AdapterError::Cancelled => SbomRelayError::Adapter(AdapterFailure::Cancelled),
            AdapterError::NoSbomsFound { location } => {
                SbomRelayError::Adapter(AdapterFailure::NoSbomsFound(location))
            }
            e if e.is_config() => SbomRelayError::Adapter(AdapterFailure::Flags(e.to_string())),
            e if e.is_source_unavailable() => {
                SbomRelayError::Adapter(AdapterFailure::SourceUnavailable(e.to_string()))
            }
            e => SbomRelayError::Adapter(AdapterFailure::Transfer(e.to_string())),
        }
    }
}

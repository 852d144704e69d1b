//! 도메인 타입: 시스템 전역에서 사용되는 공통 타입
//!
//! 입력 어댑터가 만드는 [`SbomRecord`], 분류를 거친 [`SbomDocument`],
//! 그리고 어댑터 구성에 쓰이는 역할/처리 모드를 정의합니다.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// 버전을 알 수 없을 때 사용하는 기본 버전
pub const DEFAULT_VERSION: &str = "latest";

/// 경로를 알 수 없을 때 사용하는 표시 이름
pub const UNKNOWN_FILENAME: &str = "N/A";

/// 발견된 SBOM 하나
///
/// 입력 어댑터가 발견 시점에 정확히 한 번 생성하며, 이후 변경되지 않습니다.
/// `data`는 `Bytes`이므로 복제해도 원본 버퍼를 읽기 전용으로 공유합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbomRecord {
    /// 원본 바이트 (권위 있는 페이로드)
    pub data: Bytes,
    /// 소스 내 위치 (상대 경로, 오브젝트 키, 논리 이름)
    pub path: String,
    /// 논리적 그룹 (폴더 루트, 버킷+접두사, 주 컴포넌트 이름)
    pub namespace: String,
    /// 본문에서 추론한 프로젝트 버전
    pub version: Option<String>,
}

impl SbomRecord {
    /// 새 레코드를 생성합니다.
    pub fn new(data: impl Into<Bytes>, path: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            path: path.into(),
            namespace: namespace.into(),
            version: None,
        }
    }

    /// 버전을 설정합니다.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// 버전을 반환하고, 없으면 `"latest"`를 반환합니다.
    pub fn version_or_default(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }
}

impl fmt::Display for SbomRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}@{}, {} bytes)",
            self.path,
            self.namespace,
            self.version_or_default(),
            self.data.len(),
        )
    }
}

/// SBOM 형식 (닫힌 집합)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SbomFormat {
    /// CycloneDX JSON
    #[serde(rename = "cyclonedx-json")]
    CycloneDxJson,
    /// CycloneDX XML
    #[serde(rename = "cyclonedx-xml")]
    CycloneDxXml,
    /// SPDX JSON
    #[serde(rename = "spdx-json")]
    SpdxJson,
    /// SPDX tag-value
    #[serde(rename = "spdx-tag")]
    SpdxTag,
    /// 감지 실패
    #[serde(rename = "unknown")]
    Unknown,
}

impl SbomFormat {
    /// 형식 이름 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CycloneDxJson => "cyclonedx-json",
            Self::CycloneDxXml => "cyclonedx-xml",
            Self::SpdxJson => "spdx-json",
            Self::SpdxTag => "spdx-tag",
            Self::Unknown => "unknown",
        }
    }

    /// 감지에 성공한 형식인지 확인합니다.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// JSON 직렬화 형식인지 확인합니다.
    pub fn is_json(&self) -> bool {
        matches!(self, Self::CycloneDxJson | Self::SpdxJson)
    }
}

impl fmt::Display for SbomFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 분류를 마친 SBOM 문서
///
/// `format == Unknown`이면 감지 실패를 뜻하며, 그런 문서는 저장되면 안 됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbomDocument {
    /// 감지된 형식
    pub format: SbomFormat,
    /// 본문에서 추출한 스펙 버전 (자유 형식)
    pub spec_version: String,
    /// 표시용 이름 (레코드 경로 또는 `"N/A"`)
    pub filename: String,
    /// 원본 바이트
    pub data: Bytes,
}

impl fmt::Display for SbomDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SbomDocument({}, format={}, spec={})",
            self.filename, self.format, self.spec_version,
        )
    }
}

/// 주 컴포넌트 (SBOM이 설명하는 대상)
///
/// 성공적으로 반환될 때 `name`은 항상 비어 있지 않습니다. `version`은 비어 있을 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryComponent {
    /// 프로젝트 이름
    pub name: String,
    /// 프로젝트 버전
    pub version: String,
}

impl fmt::Display for PrimaryComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}@{}", self.name, self.version)
        }
    }
}

/// 어댑터 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterRole {
    /// 입력 (SBOM 수집)
    Input,
    /// 출력 (SBOM 전달)
    Output,
}

impl AdapterRole {
    /// 이 역할이 사용하는 CLI 플래그 접두사 (`in`, `out`)
    pub fn flag_prefix(&self) -> &'static str {
        match self {
            Self::Input => "in",
            Self::Output => "out",
        }
    }
}

impl fmt::Display for AdapterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// 처리 모드: 어댑터의 fetch 전략 힌트
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// 순차 처리
    #[default]
    Sequential,
    /// 제한된 폭의 병렬 처리
    Parallel,
}

impl ProcessingMode {
    /// 문자열에서 처리 모드를 파싱합니다 (대소문자 구분 없음).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sequential" | "seq" => Some(Self::Sequential),
            "parallel" | "par" => Some(Self::Parallel),
            _ => None,
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

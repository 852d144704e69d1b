//! 후보 바이트 → 레코드 변환
//!
//! 모든 입력 어댑터는 여기서 분류를 통과한 후보만 레코드로 만듭니다.
//! 따라서 어댑터가 방출하는 레코드는 항상 비어 있지 않고 `Unknown`이 아닙니다.

use std::path::Path;

use bytes::Bytes;
use metrics::counter;
use sbomrelay_classifier::{extract_primary, is_sbom};
use sbomrelay_core::metrics as m;
use sbomrelay_core::types::{DEFAULT_VERSION, SbomRecord};
use tracing::debug;

use crate::error::AdapterError;

/// 건너뛴 이유: 분류 실패
pub(crate) const SKIP_UNKNOWN: &str = "unknown_format";
/// 건너뛴 이유: 빈 본문
pub(crate) const SKIP_EMPTY: &str = "empty_content";
/// 건너뛴 이유: 읽기 실패
pub(crate) const SKIP_IO: &str = "io_error";

/// 건너뛴 후보를 집계합니다.
pub(crate) fn skipped(adapter: &'static str, reason: &'static str) {
    counter!(
        m::RECORDS_SKIPPED_TOTAL,
        m::LABEL_ADAPTER => adapter,
        m::LABEL_REASON => reason
    )
    .increment(1);
}

fn accepted(adapter: &'static str, path: &str, data: &Bytes) -> bool {
    if data.is_empty() {
        debug!(adapter, path, "empty candidate, skipping");
        skipped(adapter, SKIP_EMPTY);
        return false;
    }
    if !is_sbom(data) {
        debug!(adapter, path, "not an sbom, skipping");
        skipped(adapter, SKIP_UNKNOWN);
        return false;
    }
    counter!(m::RECORDS_FETCHED_TOTAL, m::LABEL_ADAPTER => adapter).increment(1);
    true
}

/// 파일 후보로 레코드를 만듭니다. SBOM이 아니면 `None`입니다.
///
/// - `namespace`: 주 컴포넌트 이름, 없으면 파일 이름에서 확장자를 뺀 값
/// - `version`: 주 컴포넌트 버전, 없거나 비어 있으면 `"latest"`
pub fn folder_record(
    adapter: &'static str,
    rel_path: String,
    file_path: &Path,
    data: impl Into<Bytes>,
) -> Option<SbomRecord> {
    let data = data.into();
    if !accepted(adapter, &rel_path, &data) {
        return None;
    }

    let (namespace, version) = match extract_primary(&data) {
        Ok(primary) => {
            let version = if primary.version.is_empty() {
                DEFAULT_VERSION.to_owned()
            } else {
                primary.version
            };
            (primary.name, version)
        }
        Err(_) => (file_stem(file_path), DEFAULT_VERSION.to_owned()),
    };

    Some(SbomRecord::new(data, rel_path, namespace).with_version(version))
}

/// 오브젝트 후보로 레코드를 만듭니다. SBOM이 아니면 `None`입니다.
///
/// 네임스페이스는 `bucket-prefix`로 고정되고, 버전은 주 컴포넌트에서 얻을 때만 채웁니다.
pub fn object_record(
    adapter: &'static str,
    rel_key: &str,
    namespace: &str,
    data: Bytes,
) -> Option<SbomRecord> {
    if !accepted(adapter, rel_key, &data) {
        return None;
    }

    let version = extract_primary(&data)
        .ok()
        .map(|p| p.version)
        .filter(|v| !v.is_empty());

    let record = SbomRecord::new(data, rel_key, namespace);
    Some(match version {
        Some(v) => record.with_version(v),
        None => record,
    })
}

/// 후보 파일을 읽습니다. 실패는 레코드 단위 [`AdapterError::Io`]입니다.
pub(crate) async fn read_file(path: &Path) -> Result<Vec<u8>, AdapterError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| AdapterError::Io {
            path: path.display().to_string(),
            source,
        })
}

/// 상대 경로 문자열. 루트 밖이면 전체 경로를 씁니다.
pub(crate) fn relative_path(root: &Path, file: &Path) -> String {
    file.strip_prefix(root)
        .unwrap_or(file)
        .to_string_lossy()
        .into_owned()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

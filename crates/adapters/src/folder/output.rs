//! 폴더 출력: 레코드를 로컬 디렉토리에 원본 그대로 기록

use std::path::{Component, Path, PathBuf};

use metrics::counter;
use sbomrelay_classifier::{ClassifierError, Processor, output_path, write_bytes};
use sbomrelay_core::context::TransferContext;
use sbomrelay_core::metrics as m;
use sbomrelay_core::types::{SbomRecord, UNKNOWN_FILENAME};
use tracing::{debug, info, warn};

use crate::adapter::UploadSummary;
use crate::error::AdapterError;
use crate::iterator::SbomIterator;

const ADAPTER: &str = "folder";

/// 레코드의 출력 경로를 계산합니다.
///
/// 경로가 비어 있거나 `"N/A"`이면 `<dir>/<namespace>.sbom.json`을 씁니다.
/// 루트를 벗어나는 경로(`..`, 절대 경로)는 거부합니다.
pub fn destination(dir: &Path, record: &SbomRecord) -> Result<PathBuf, AdapterError> {
    if record.path.is_empty() || record.path == UNKNOWN_FILENAME {
        return Ok(output_path(dir, &record.namespace)?);
    }

    let escapes = Path::new(&record.path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(ClassifierError::InvalidOutputName(record.path.clone()).into());
    }
    Ok(dir.join(&record.path))
}

/// 스트림을 끝까지 소비하며 각 레코드를 기록합니다.
///
/// 분류에 실패한 레코드는 건너뛰고, 기록 실패는 모아 두었다가 하나의 집계 에러로 반환합니다.
/// 이터레이터 에러는 즉시 전파됩니다.
pub(crate) async fn upload(
    dir: &Path,
    ctx: &TransferContext,
    mut iter: SbomIterator,
) -> Result<UploadSummary, AdapterError> {
    let processor = Processor::default();
    let mut summary = UploadSummary::default();
    let mut failures = Vec::new();

    while let Some(record) = iter.next(ctx).await? {
        if let Err(e) = processor.process(&record.data, &record.namespace, &record.path) {
            warn!(path = %record.path, error = %e, "skipping unclassifiable record");
            summary.skipped += 1;
            continue;
        }

        let written = match destination(dir, &record) {
            Ok(target) => write_bytes(&target, &record.data)
                .await
                .map(|()| target)
                .map_err(AdapterError::from),
            Err(e) => Err(e),
        };

        match written {
            Ok(target) => {
                debug!(path = %record.path, target = %target.display(), "record written");
                counter!(m::UPLOADS_TOTAL, m::LABEL_ADAPTER => ADAPTER, m::LABEL_RESULT => "success")
                    .increment(1);
                summary.uploaded += 1;
            }
            Err(e) => {
                warn!(path = %record.path, error = %e, "failed to write record");
                counter!(m::UPLOADS_TOTAL, m::LABEL_ADAPTER => ADAPTER, m::LABEL_RESULT => "failure")
                    .increment(1);
                failures.push(e);
            }
        }
    }
    iter.close().await;

    info!(
        dir = %dir.display(),
        uploaded = summary.uploaded,
        skipped = summary.skipped,
        failed = failures.len(),
        "folder output finished"
    );
    match AdapterError::aggregate(failures) {
        Some(err) => Err(err),
        None => Ok(summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CDX: &[u8] = br#"{"bomFormat":"CycloneDX","specVersion":"1.5","components":[]}"#;

    #[test]
    fn destination_uses_record_path() {
        let record = SbomRecord::new(CDX, "team/app.json", "app");
        assert_eq!(
            destination(Path::new("/out"), &record).unwrap(),
            PathBuf::from("/out/team/app.json")
        );
    }

    #[test]
    fn destination_falls_back_to_namespace() {
        let record = SbomRecord::new(CDX, UNKNOWN_FILENAME, "app");
        assert_eq!(
            destination(Path::new("/out"), &record).unwrap(),
            PathBuf::from("/out/app.sbom.json")
        );
        let empty = SbomRecord::new(CDX, "", "lib");
        assert_eq!(
            destination(Path::new("/out"), &empty).unwrap(),
            PathBuf::from("/out/lib.sbom.json")
        );
    }

    #[test]
    fn destination_rejects_escaping_paths() {
        for path in ["../x.json", "/etc/x.json", "a/../../x.json"] {
            let record = SbomRecord::new(CDX, path, "app");
            assert!(destination(Path::new("/out"), &record).is_err(), "{path}");
        }
    }

    #[tokio::test]
    async fn upload_writes_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = TransferContext::new();
        let iter = SbomIterator::from_records(vec![
            SbomRecord::new(CDX, "a.json", "a"),
            SbomRecord::new(&b"plain text"[..], "notes.txt", "notes"),
            SbomRecord::new(CDX, "nested/b.json", "b"),
        ]);

        let summary = upload(dir.path(), &ctx, iter).await.unwrap();
        assert_eq!(summary.uploaded, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(std::fs::read(dir.path().join("a.json")).unwrap(), CDX);
        assert_eq!(std::fs::read(dir.path().join("nested/b.json")).unwrap(), CDX);
        assert!(!dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn upload_aggregates_failures_after_draining() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = TransferContext::new();
        let iter = SbomIterator::from_records(vec![
            SbomRecord::new(CDX, "../escape.json", "x"),
            SbomRecord::new(CDX, "ok.json", "ok"),
            SbomRecord::new(CDX, "/abs.json", "y"),
        ]);

        let err = upload(dir.path(), &ctx, iter).await.unwrap_err();
        match err {
            AdapterError::Aggregate { count, .. } => assert_eq!(count, 2),
            other => panic!("unexpected: {other}"),
        }
        // 실패와 무관하게 나머지는 기록됨
        assert!(dir.path().join("ok.json").exists());
    }
}

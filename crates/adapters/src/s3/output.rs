//! 오브젝트 스토어 출력: 레코드를 `<prefix><record.path>`에 업로드

use metrics::counter;
use sbomrelay_classifier::{OUTPUT_SUFFIX, Processor};
use sbomrelay_core::context::TransferContext;
use sbomrelay_core::metrics as m;
use sbomrelay_core::types::{SbomRecord, UNKNOWN_FILENAME};
use tracing::{debug, info, warn};

use super::client::ObjectStoreClient;
use super::config::S3Config;
use crate::adapter::UploadSummary;
use crate::error::AdapterError;
use crate::iterator::SbomIterator;

const ADAPTER: &str = "s3";

/// 레코드의 대상 오브젝트 키
///
/// 경로가 비어 있거나 `"N/A"`이면 `<prefix><namespace>.sbom.json`입니다.
pub fn object_key(config: &S3Config, record: &SbomRecord) -> String {
    if record.path.is_empty() || record.path == UNKNOWN_FILENAME {
        config.object_key(&format!("{}{OUTPUT_SUFFIX}", record.namespace))
    } else {
        config.object_key(&record.path)
    }
}

/// 버킷을 검사한 뒤 스트림의 모든 레코드를 업로드합니다.
///
/// 분류 실패 레코드는 건너뛰고, 업로드 실패는 끝까지 진행한 뒤 집계 에러로 반환합니다.
pub async fn upload_records<C: ObjectStoreClient>(
    client: &C,
    config: &S3Config,
    ctx: &TransferContext,
    mut iter: SbomIterator,
) -> Result<UploadSummary, AdapterError> {
    tokio::select! {
        biased;
        _ = ctx.cancelled() => return Err(AdapterError::Cancelled),
        probed = client.head_bucket(&config.bucket) => probed?,
    }

    let processor = Processor::default();
    let mut summary = UploadSummary::default();
    let mut failures = Vec::new();

    while let Some(record) = iter.next(ctx).await? {
        if let Err(e) = processor.process(&record.data, &record.namespace, &record.path) {
            warn!(path = %record.path, error = %e, "skipping unclassifiable record");
            summary.skipped += 1;
            continue;
        }

        let key = object_key(config, &record);
        let put = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(AdapterError::Cancelled),
            put = client.put_object(&config.bucket, &key, record.data.clone()) => put,
        };

        match put {
            Ok(()) => {
                debug!(key = %key, bytes = record.data.len(), "record uploaded");
                counter!(m::UPLOADS_TOTAL, m::LABEL_ADAPTER => ADAPTER, m::LABEL_RESULT => "success")
                    .increment(1);
                summary.uploaded += 1;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "failed to upload record");
                counter!(m::UPLOADS_TOTAL, m::LABEL_ADAPTER => ADAPTER, m::LABEL_RESULT => "failure")
                    .increment(1);
                failures.push(e);
            }
        }
    }
    iter.close().await;

    info!(
        location = %config.location(),
        uploaded = summary.uploaded,
        skipped = summary.skipped,
        failed = failures.len(),
        "object store output finished"
    );
    match AdapterError::aggregate(failures) {
        Some(err) => Err(err),
        None => Ok(summary),
    }
}

//! 메트릭 상수 및 설명 등록
//!
//! 전송 파이프라인이 기록하는 메트릭의 이름과 설명을 한곳에 모읍니다.
//! 어댑터와 리포터는 이 상수로 `metrics::counter!()`, `metrics::histogram!()`을 호출합니다.
//! 레코더를 설치하지 않으면 모든 호출은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `sbomrelay_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//! use sbomrelay_core::metrics;
//!
//! counter!(metrics::RECORDS_FETCHED_TOTAL, metrics::LABEL_ADAPTER => "folder").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 어댑터 레이블 키 (folder, folder-watch, s3)
pub const LABEL_ADAPTER: &str = "adapter";

/// SBOM 형식 레이블 키 (cyclonedx-json, spdx-tag 등)
pub const LABEL_FORMAT: &str = "format";

/// 건너뛴 이유 레이블 키 (unknown_format, empty_content, io_error)
pub const LABEL_REASON: &str = "reason";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── 입력 어댑터 메트릭 ─────────────────────────────────────────────

/// 입력 어댑터가 방출한 레코드 수 (counter, label: adapter)
pub const RECORDS_FETCHED_TOTAL: &str = "sbomrelay_records_fetched_total";

/// 분류/읽기 실패로 건너뛴 후보 수 (counter, labels: adapter, reason)
pub const RECORDS_SKIPPED_TOTAL: &str = "sbomrelay_records_skipped_total";

/// 폴더 감시가 수신한 파일 시스템 이벤트 수 (counter)
pub const WATCH_EVENTS_TOTAL: &str = "sbomrelay_watch_events_total";

// ─── 처리/출력 메트릭 ───────────────────────────────────────────────

/// 프로세서가 분류한 문서 수 (counter, label: format)
pub const DOCUMENTS_PROCESSED_TOTAL: &str = "sbomrelay_documents_processed_total";

/// 출력 어댑터 업로드 결과 수 (counter, labels: adapter, result)
pub const UPLOADS_TOTAL: &str = "sbomrelay_uploads_total";

/// 전송 한 번의 전체 소요 시간 (histogram, 초)
pub const TRANSFER_DURATION_SECONDS: &str = "sbomrelay_transfer_duration_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 레코더를 설치하는 임베딩 프로그램이 시작 시 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        RECORDS_FETCHED_TOTAL,
        "Total number of SBOM records emitted by input adapters"
    );
    describe_counter!(
        RECORDS_SKIPPED_TOTAL,
        "Total number of candidate blobs skipped (not an SBOM or unreadable)"
    );
    describe_counter!(
        WATCH_EVENTS_TOTAL,
        "Total number of filesystem events received by the folder watcher"
    );
    describe_counter!(
        DOCUMENTS_PROCESSED_TOTAL,
        "Total number of documents classified by the processor"
    );
    describe_counter!(
        UPLOADS_TOTAL,
        "Total number of output adapter deliveries by result"
    );
    describe_histogram!(
        TRANSFER_DURATION_SECONDS,
        "Wall time of a single transfer run in seconds"
    );
}

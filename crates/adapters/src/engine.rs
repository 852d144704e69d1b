//! 전송 엔진: 입력 어댑터의 스트림을 출력 단계로 넘기는 드라이버
//!
//! | dry_run | 출력 어댑터 | 동작 |
//! |---------|-------------|------|
//! | false   | 있음        | `output.upload` |
//! | true    | 있음        | `output.dry_run` |
//! | -       | 없음        | `input.dry_run` (리포트 모드) |

use std::collections::BTreeMap;
use std::io::Write;
use std::time::Instant;

use metrics::histogram;
use sbomrelay_core::context::TransferContext;
use sbomrelay_core::metrics as m;
use serde::Serialize;
use tracing::{Instrument, info};

use crate::adapter::Adapter;
use crate::error::AdapterError;
use crate::reporter::{DryRunReporter, DryRunSummary};

/// 전송 옵션
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOptions {
    /// 업로드 없이 리포트만
    pub dry_run: bool,
}

/// 전송 결과 요약
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferSummary {
    /// 실행 ID
    pub run_id: String,
    /// 입력 어댑터 이름
    pub input: String,
    /// 출력 어댑터 이름
    pub output: Option<String>,
    /// dry-run 여부
    pub dry_run: bool,
    /// 입력에서 받은 레코드 수
    pub records: u64,
    /// 업로드한 레코드 수
    pub uploaded: u64,
    /// 출력 단계에서 건너뛴 레코드 수
    pub skipped: u64,
    /// 출력 디렉토리에 기록한 레코드 수
    pub written: u64,
    /// 형식별 레코드 수 (리포트 모드)
    pub by_format: BTreeMap<String, u64>,
    /// 소요 시간 (초)
    pub duration_secs: f64,
}

impl TransferSummary {
    fn new(ctx: &TransferContext, input: &Adapter, output: Option<&Adapter>, dry_run: bool) -> Self {
        Self {
            run_id: ctx.run_id().to_string(),
            input: input.name().to_owned(),
            output: output.map(|o| o.name().to_owned()),
            dry_run,
            records: 0,
            uploaded: 0,
            skipped: 0,
            written: 0,
            by_format: BTreeMap::new(),
            duration_secs: 0.0,
        }
    }

    fn apply_report(&mut self, report: DryRunSummary) {
        self.records = report.total;
        self.written = report.written;
        self.by_format = report.by_format;
    }
}

/// 입력 어댑터에서 스트림을 열고 출력 단계까지 흘려 보냅니다.
pub async fn transfer<W: Write + Send>(
    ctx: &TransferContext,
    input: &Adapter,
    output: Option<&Adapter>,
    options: TransferOptions,
    reporter: &mut DryRunReporter<W>,
) -> Result<TransferSummary, AdapterError> {
    let started = Instant::now();
    let mut summary = TransferSummary::new(ctx, input, output, options.dry_run);

    async {
        let iter = input.fetch(ctx).await?;
        match (output, options.dry_run) {
            (Some(output), false) => {
                let uploaded = output.upload(ctx, iter).await?;
                summary.records = uploaded.uploaded + uploaded.skipped;
                summary.uploaded = uploaded.uploaded;
                summary.skipped = uploaded.skipped;
            }
            (Some(output), true) => {
                let report = output.dry_run(ctx, iter, reporter).await?;
                summary.apply_report(report);
            }
            (None, _) => {
                let report = input.dry_run(ctx, iter, reporter).await?;
                summary.apply_report(report);
            }
        }
        Ok::<_, AdapterError>(())
    }
    .instrument(ctx.span().clone())
    .await?;

    let elapsed = started.elapsed();
    histogram!(m::TRANSFER_DURATION_SECONDS).record(elapsed.as_secs_f64());
    summary.duration_secs = elapsed.as_secs_f64();

    info!(
        run_id = %summary.run_id,
        input = %summary.input,
        output = summary.output.as_deref().unwrap_or("-"),
        records = summary.records,
        uploaded = summary.uploaded,
        dry_run = summary.dry_run,
        "transfer finished"
    );
    Ok(summary)
}

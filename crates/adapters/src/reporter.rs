//! 출력 리포터: dry-run / 리포트 모드에서 스트림을 끝까지 소비
//!
//! 레코드마다 프로세서로 분류하고, 출력 디렉토리가 설정되어 있으면 기록하며,
//! 요약 한 줄(verbose면 pretty-print 본문까지)을 출력합니다.
//! 이터레이터나 프로세서 에러는 즉시 소비를 중단하고 전파됩니다.
//!
//! 출력 파일 이름은 레코드 경로에서 확장자를 뗀 값입니다. 같은 네임스페이스를 공유하는
//! 오브젝트 스토어 레코드도 서로 다른 파일로 기록됩니다.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use sbomrelay_classifier::{Processor, output_path, pretty_print};
use sbomrelay_core::context::TransferContext;
use sbomrelay_core::types::{SbomRecord, UNKNOWN_FILENAME};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::AdapterError;
use crate::iterator::SbomIterator;

/// 리포트 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DryRunSummary {
    /// 처리한 레코드 수
    pub total: u64,
    /// 형식별 레코드 수
    pub by_format: BTreeMap<String, u64>,
    /// 출력 디렉토리에 기록한 수
    pub written: u64,
}

/// 레코드의 출력 이름 (`<output_dir>/<name>.sbom.json`)
///
/// 경로가 있으면 마지막 확장자를 뗀 상대 경로, 없거나 `"N/A"`이면 네임스페이스입니다.
pub fn report_name(record: &SbomRecord) -> String {
    if record.path.is_empty() || record.path == UNKNOWN_FILENAME {
        return record.namespace.trim_end_matches('/').to_owned();
    }
    Path::new(&record.path)
        .with_extension("")
        .to_string_lossy()
        .into_owned()
}

/// dry-run 리포터
pub struct DryRunReporter<W> {
    processor: Processor,
    verbose: bool,
    out: W,
}

impl<W: Write + Send> DryRunReporter<W> {
    /// 새 리포터를 생성합니다.
    pub fn new(processor: Processor, verbose: bool, out: W) -> Self {
        Self {
            processor,
            verbose,
            out,
        }
    }

    /// 출력 대상을 돌려받습니다.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: std::fmt::Arguments<'_>) -> Result<(), AdapterError> {
        self.out.write_fmt(line).map_err(AdapterError::Report)?;
        self.out.write_all(b"\n").map_err(AdapterError::Report)
    }

    /// 스트림을 끝까지 소비합니다.
    ///
    /// `destination`은 출력 어댑터가 레코드를 보낼 위치를 알려 줍니다 (없으면 `None`).
    pub async fn drain<F>(
        &mut self,
        ctx: &TransferContext,
        mut iter: SbomIterator,
        destination: F,
    ) -> Result<DryRunSummary, AdapterError>
    where
        F: Fn(&SbomRecord) -> Option<String>,
    {
        let mut summary = DryRunSummary::default();
        let mut targets: HashSet<PathBuf> = HashSet::new();

        while let Some(record) = iter.next(ctx).await? {
            let doc = self
                .processor
                .process(&record.data, &record.namespace, &record.path)?;

            let name = report_name(&record);
            let duplicate = match self.processor.output_dir() {
                Some(dir) => !targets.insert(output_path(dir, &name)?),
                None => false,
            };
            let written = if duplicate {
                warn!(
                    path = %doc.filename,
                    name = %name,
                    "output file already written in this run, skipping"
                );
                None
            } else {
                self.processor.write(&doc, &name).await?
            };

            summary.total += 1;
            *summary
                .by_format
                .entry(doc.format.as_str().to_owned())
                .or_insert(0) += 1;

            self.emit(format_args!(
                "{:>4}. {} [{} {}] {}@{}",
                summary.total,
                doc.filename,
                doc.format,
                doc.spec_version,
                record.namespace,
                record.version_or_default(),
            ))?;
            if let Some(dest) = destination(&record) {
                self.emit(format_args!("      -> {dest}"))?;
            }
            if let Some(path) = written {
                summary.written += 1;
                self.emit(format_args!("      written: {}", path.display()))?;
            }

            if self.verbose && doc.format.is_json() {
                match pretty_print(&record.data) {
                    Ok(body) => self.out.write_all(body.as_bytes()).map_err(AdapterError::Report)?,
                    Err(e) => warn!(path = %doc.filename, error = %e, "cannot pretty-print body"),
                }
            }
            debug!(path = %doc.filename, format = %doc.format, "record reported");
        }
        iter.close().await;

        self.emit(format_args!("Total SBOMs: {}", summary.total))?;
        self.out.flush().map_err(AdapterError::Report)?;
        info!(total = summary.total, written = summary.written, "dry run finished");
        Ok(summary)
    }
}

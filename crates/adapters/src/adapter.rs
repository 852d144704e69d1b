//! 어댑터: 입력/출력 경계의 닫힌 변형 집합
//!
//! 공통 기능 {add_flags, parse_and_validate, fetch, upload, dry_run}은
//! 변형 태그에 대한 `match`로 분배됩니다.
//!
//! # 사용 예시
//!
//! ```ignore
//! let cmd = flags::register_all(Command::new("sbomrelay"));
//! let matches = cmd.get_matches();
//! let input = Adapter::parse_and_validate(AdapterKind::Folder, AdapterRole::Input, &matches, settings)?;
//! let iter = input.fetch(&ctx).await?;
//! ```

use std::io::Write;

use clap::{ArgMatches, Command};
use sbomrelay_core::config::TransferConfig;
use sbomrelay_core::context::TransferContext;
use sbomrelay_core::types::{AdapterRole, ProcessingMode, SbomRecord};
use serde::Serialize;
use tracing::Instrument;

use crate::error::AdapterError;
use crate::flags::{self, AdapterKind};
use crate::folder::{self, FolderAdapter, FolderConfig};
use crate::iterator::SbomIterator;
use crate::reporter::{DryRunReporter, DryRunSummary};
use crate::s3::{self, S3Adapter, S3Config};

/// 어댑터 실행 설정 (처리 모드와 버퍼 크기)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterSettings {
    /// 처리 모드
    pub mode: ProcessingMode,
    /// parallel 모드 워커 수
    pub parallel_workers: usize,
    /// 감시 버퍼 용량
    pub watch_buffer_capacity: usize,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::Sequential,
            parallel_workers: 4,
            watch_buffer_capacity: 10,
        }
    }
}

impl From<&TransferConfig> for AdapterSettings {
    fn from(config: &TransferConfig) -> Self {
        Self {
            mode: config.mode(),
            parallel_workers: config.parallel_workers,
            watch_buffer_capacity: config.watch_buffer_capacity,
        }
    }
}

/// 출력 어댑터의 업로드 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    /// 기록/업로드한 레코드 수
    pub uploaded: u64,
    /// 분류 실패로 건너뛴 레코드 수
    pub skipped: u64,
}

/// 입력 또는 출력 어댑터
#[derive(Debug, Clone)]
pub enum Adapter {
    /// 로컬 폴더
    Folder(FolderAdapter),
    /// S3 오브젝트 스토어
    S3(S3Adapter),
}

/// 필수 값 플래그. `flags::validate` 이후에도 타입으로 보장되지는 않으므로 다시 확인합니다.
fn required(matches: &ArgMatches, name: &str) -> Result<String, AdapterError> {
    flags::value(matches, name).ok_or_else(|| AdapterError::MissingFlags(vec![format!("--{name}")]))
}

/// 버킷 이름 플래그. `/`나 공백이 들어간 이름은 키 접두사를 잘못 넣은 경우입니다.
fn bucket_name(matches: &ArgMatches, name: &str) -> Result<String, AdapterError> {
    let bucket = required(matches, name)?;
    if bucket.contains('/') || bucket.chars().any(char::is_whitespace) {
        return Err(AdapterError::InvalidValue {
            flag: format!("--{name}"),
            reason: format!("'{bucket}' is not a bucket name (use the prefix flag for key paths)"),
        });
    }
    Ok(bucket)
}

impl Adapter {
    /// 이 어댑터 종류/역할의 플래그를 등록합니다.
    pub fn add_flags(cmd: Command, kind: AdapterKind, role: AdapterRole) -> Command {
        flags::add_flags(cmd, kind, role)
    }

    /// 플래그를 읽고 검증해 어댑터를 만듭니다. I/O는 하지 않습니다.
    pub fn parse_and_validate(
        kind: AdapterKind,
        role: AdapterRole,
        matches: &ArgMatches,
        settings: AdapterSettings,
    ) -> Result<Self, AdapterError> {
        flags::validate(matches, kind, role)?;

        let adapter = match (kind, role) {
            (AdapterKind::Folder, AdapterRole::Input) => {
                let config = FolderConfig::new(required(matches, flags::IN_FOLDER_PATH)?)
                    .recursive(flags::switch(matches, flags::IN_FOLDER_RECURSIVE))
                    .watch(flags::switch(matches, flags::IN_FOLDER_WATCH));
                Self::Folder(FolderAdapter::new(role, config, settings))
            }
            (AdapterKind::Folder, AdapterRole::Output) => {
                let config = FolderConfig::new(required(matches, flags::OUT_FOLDER_PATH)?);
                Self::Folder(FolderAdapter::new(role, config, settings))
            }
            (AdapterKind::S3, AdapterRole::Input) => {
                let config = S3Config::new(
                    bucket_name(matches, flags::IN_S3_BUCKET_NAME)?,
                    required(matches, flags::IN_S3_REGION)?,
                    required(matches, flags::IN_S3_PREFIX)?,
                );
                Self::S3(S3Adapter::new(role, config, settings))
            }
            (AdapterKind::S3, AdapterRole::Output) => {
                let config = S3Config::new(
                    bucket_name(matches, flags::OUT_S3_BUCKET_NAME)?,
                    required(matches, flags::OUT_S3_REGION)?,
                    required(matches, flags::OUT_S3_PREFIX)?,
                );
                Self::S3(S3Adapter::new(role, config, settings))
            }
        };
        Ok(adapter)
    }

    /// 어댑터 종류
    pub fn kind(&self) -> AdapterKind {
        match self {
            Self::Folder(_) => AdapterKind::Folder,
            Self::S3(_) => AdapterKind::S3,
        }
    }

    /// 어댑터 역할
    pub fn role(&self) -> AdapterRole {
        match self {
            Self::Folder(a) => a.role(),
            Self::S3(a) => a.role(),
        }
    }

    /// 로그 태그용 이름
    pub fn name(&self) -> &'static str {
        match self {
            Self::Folder(_) => folder::ADAPTER_NAME,
            Self::S3(_) => s3::ADAPTER_NAME,
        }
    }

    fn unsupported(&self, operation: &'static str) -> AdapterError {
        AdapterError::UnsupportedOperation {
            adapter: self.name(),
            role: self.role(),
            operation,
        }
    }

    /// 입력 레코드 스트림을 엽니다 (입력 역할 전용).
    pub async fn fetch(&self, ctx: &TransferContext) -> Result<SbomIterator, AdapterError> {
        if self.role() != AdapterRole::Input {
            return Err(self.unsupported("fetch"));
        }
        let ctx = ctx.child(self.name());
        let span = ctx.span().clone();
        async {
            match self {
                Self::Folder(a) => a.fetch(&ctx).await,
                Self::S3(a) => a.fetch(&ctx).await,
            }
        }
        .instrument(span)
        .await
    }

    /// 스트림을 출력 대상에 기록합니다 (출력 역할 전용).
    pub async fn upload(
        &self,
        ctx: &TransferContext,
        iter: SbomIterator,
    ) -> Result<UploadSummary, AdapterError> {
        if self.role() != AdapterRole::Output {
            return Err(self.unsupported("upload"));
        }
        let ctx = ctx.child(self.name());
        let span = ctx.span().clone();
        async {
            match self {
                Self::Folder(a) => a.upload(&ctx, iter).await,
                Self::S3(a) => a.upload(&ctx, iter).await,
            }
        }
        .instrument(span)
        .await
    }

    /// 아무것도 업로드하지 않고 스트림을 리포터로 소비합니다.
    pub async fn dry_run<W: Write + Send>(
        &self,
        ctx: &TransferContext,
        iter: SbomIterator,
        reporter: &mut DryRunReporter<W>,
    ) -> Result<DryRunSummary, AdapterError> {
        reporter
            .drain(ctx, iter, |record| self.planned_destination(record))
            .await
    }

    /// 출력 어댑터가 레코드를 기록할 위치. 입력 어댑터는 `None`입니다.
    pub fn planned_destination(&self, record: &SbomRecord) -> Option<String> {
        if self.role() != AdapterRole::Output {
            return None;
        }
        match self {
            Self::Folder(a) => Some(match folder::output::destination(&a.config().path, record) {
                Ok(path) => path.display().to_string(),
                Err(e) => format!("<rejected: {e}>"),
            }),
            Self::S3(a) => Some(format!(
                "s3://{}/{}",
                a.config().bucket,
                s3::output::object_key(a.config(), record)
            )),
        }
    }
}

//! 폴더 어댑터: 로컬 디렉토리 입력(스캔/감시)과 출력
//!
//! - [`scan`]: 디렉토리 트리를 한 번 순회 (sequential은 inline, parallel은 워커 풀)
//! - [`watch`]: 파일 시스템 이벤트를 bounded 버퍼로 중계하는 백그라운드 생산자
//! - [`output`]: 레코드를 `<dir>/<record.path>`에 기록

pub mod output;
pub mod scan;
pub mod watch;

use std::path::PathBuf;

use sbomrelay_core::context::TransferContext;
use sbomrelay_core::types::AdapterRole;
use tracing::info;

use crate::adapter::{AdapterSettings, UploadSummary};
use crate::error::AdapterError;
use crate::iterator::SbomIterator;

/// 폴더 어댑터 이름
pub const ADAPTER_NAME: &str = "folder";

/// 폴더 어댑터 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderConfig {
    /// 루트 디렉토리
    pub path: PathBuf,
    /// 하위 디렉토리 포함 여부
    pub recursive: bool,
    /// 한 번 순회 대신 변경 감시
    pub watch: bool,
}

impl FolderConfig {
    /// 비재귀 스캔 설정
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: false,
            watch: false,
        }
    }

    /// 재귀 여부를 설정합니다.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 감시 모드를 설정합니다.
    pub fn watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }
}

/// 폴더 어댑터
#[derive(Debug, Clone)]
pub struct FolderAdapter {
    role: AdapterRole,
    config: FolderConfig,
    settings: AdapterSettings,
}

impl FolderAdapter {
    /// 검증을 마친 설정으로 어댑터를 만듭니다.
    pub fn new(role: AdapterRole, config: FolderConfig, settings: AdapterSettings) -> Self {
        Self {
            role,
            config,
            settings,
        }
    }

    /// 어댑터 역할
    pub fn role(&self) -> AdapterRole {
        self.role
    }

    /// 어댑터 설정
    pub fn config(&self) -> &FolderConfig {
        &self.config
    }

    /// 입력 레코드 스트림을 엽니다.
    ///
    /// 루트를 열 수 없으면 여기서 바로 실패합니다.
    pub async fn fetch(&self, ctx: &TransferContext) -> Result<SbomIterator, AdapterError> {
        info!(
            path = %self.config.path.display(),
            recursive = self.config.recursive,
            watch = self.config.watch,
            mode = %self.settings.mode,
            "opening folder input"
        );
        if self.config.watch {
            watch::start(&self.config, &self.settings, ctx).await
        } else {
            scan::start(&self.config, &self.settings, ctx).await
        }
    }

    /// 스트림의 모든 레코드를 출력 디렉토리에 기록합니다.
    pub async fn upload(
        &self,
        ctx: &TransferContext,
        iter: SbomIterator,
    ) -> Result<UploadSummary, AdapterError> {
        output::upload(&self.config.path, ctx, iter).await
    }
}

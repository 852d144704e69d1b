//! 폴더 스캔: 디렉토리 트리를 한 번 순회하며 SBOM 파일을 방출
//!
//! sequential 모드는 `next` 호출이 순회와 읽기를 직접 진행합니다 (상주 보조 태스크 없음,
//! 디렉토리 읽기만 블로킹 스레드에서 한 걸음씩).
//! 순서는 파일 이름 정렬 기준 walk 순서입니다.
//! parallel 모드는 블로킹 스레드가 파일 목록을 만들고 워커 풀이 읽기/분류를 나눠 맡습니다.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sbomrelay_core::context::TransferContext;
use sbomrelay_core::types::{ProcessingMode, SbomRecord};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::FolderConfig;
use crate::adapter::AdapterSettings;
use crate::error::AdapterError;
use crate::iterator::{ChannelSource, NextResult, RecordSource, SbomIterator};
use crate::pool::{PoolConfig, spawn_workers};
use crate::record::{SKIP_IO, folder_record, read_file, relative_path, skipped};

const ADAPTER: &str = "folder";

/// 스캔 이터레이터를 엽니다.
pub(crate) async fn start(
    config: &FolderConfig,
    settings: &AdapterSettings,
    ctx: &TransferContext,
) -> Result<SbomIterator, AdapterError> {
    check_root(&config.path).await?;

    let iter = match settings.mode {
        ProcessingMode::Sequential => {
            SbomIterator::new(ScanSource::new(config.path.clone(), config.recursive))
        }
        ProcessingMode::Parallel => parallel(
            config.path.clone(),
            config.recursive,
            settings.parallel_workers,
            ctx,
        ),
    };
    Ok(iter)
}

/// 루트가 열 수 있는 디렉토리인지 확인합니다.
async fn check_root(root: &Path) -> Result<(), AdapterError> {
    let unreadable = |source| AdapterError::RootUnreadable {
        path: root.display().to_string(),
        source,
    };

    let meta = tokio::fs::metadata(root).await.map_err(unreadable)?;
    if !meta.is_dir() {
        return Err(unreadable(io::Error::new(
            io::ErrorKind::NotADirectory,
            "not a directory",
        )));
    }
    tokio::fs::read_dir(root).await.map_err(unreadable)?;
    Ok(())
}

fn walker(root: &Path, recursive: bool) -> walkdir::IntoIter {
    let max_depth = if recursive { usize::MAX } else { 1 };
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
}

/// 파일 하나를 읽어 레코드로 만듭니다. 읽기 실패는 로그 후 건너뜁니다.
async fn read_candidate(root: &Path, file: PathBuf) -> Option<SbomRecord> {
    match read_file(&file).await {
        Ok(data) => folder_record(ADAPTER, relative_path(root, &file), &file, data),
        Err(e) => {
            warn!(error = %e, "failed to read file, skipping");
            skipped(ADAPTER, SKIP_IO);
            None
        }
    }
}

/// inline 스캔 소스
///
/// 디렉토리 읽기는 블로킹이므로 walk 한 걸음마다 `spawn_blocking`으로 넘깁니다.
struct ScanSource {
    root: PathBuf,
    walker: Option<walkdir::IntoIter>,
}

impl ScanSource {
    fn new(root: PathBuf, recursive: bool) -> Self {
        let walker = Some(walker(&root, recursive));
        Self { root, walker }
    }

    /// 다음 일반 파일 경로. 취소로 walker를 잃었으면 `None`입니다.
    async fn next_file(&mut self, ctx: &TransferContext) -> Result<Option<PathBuf>, AdapterError> {
        let Some(mut walker) = self.walker.take() else {
            return Ok(None);
        };
        let root = self.root.clone();
        let step = tokio::task::spawn_blocking(move || {
            let next = next_file(&mut walker, &root);
            (walker, next)
        });

        let (walker, next) = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(AdapterError::Cancelled),
            joined = step => joined.map_err(|e| AdapterError::Producer(e.to_string()))?,
        };
        self.walker = Some(walker);
        next
    }
}

/// walker에서 다음 일반 파일을 꺼냅니다. 루트 자체의 에러만 치명적입니다.
fn next_file(walker: &mut walkdir::IntoIter, root: &Path) -> Result<Option<PathBuf>, AdapterError> {
    for entry in walker.by_ref() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => return Ok(Some(entry.into_path())),
            Ok(_) => {}
            Err(e) if e.depth() == 0 => {
                return Err(AdapterError::RootUnreadable {
                    path: root.display().to_string(),
                    source: io::Error::from(e),
                });
            }
            Err(e) => {
                warn!(error = %e, "walk error, skipping entry");
                skipped(ADAPTER, SKIP_IO);
            }
        }
    }
    Ok(None)
}

impl RecordSource for ScanSource {
    async fn next_record(&mut self, ctx: &TransferContext) -> NextResult {
        loop {
            if ctx.is_cancelled() {
                return Err(AdapterError::Cancelled);
            }
            let Some(file) = self.next_file(ctx).await? else {
                return Ok(None);
            };

            let found = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(AdapterError::Cancelled),
                found = read_candidate(&self.root, file) => found,
            };
            if let Some(record) = found {
                return Ok(Some(record));
            }
        }
    }
}

/// parallel 스캔: 블로킹 walker → 키 커서 → 워커 풀 → 결과 버퍼
fn parallel(root: PathBuf, recursive: bool, workers: usize, ctx: &TransferContext) -> SbomIterator {
    let token = ctx.token().child_token();
    let pool = PoolConfig::with_workers(workers);
    let (key_tx, key_rx) = mpsc::channel::<PathBuf>(pool.buffer);
    let (result_tx, result_rx) = mpsc::channel(pool.buffer);

    let walk_root = root.clone();
    let walk_token = token.clone();
    let lister = tokio::task::spawn_blocking(move || {
        let mut listed = 0usize;
        for entry in walker(&walk_root, recursive) {
            if walk_token.is_cancelled() {
                break;
            }
            let path = match entry {
                Ok(entry) if entry.file_type().is_file() => entry.into_path(),
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "walk error, skipping entry");
                    skipped(ADAPTER, SKIP_IO);
                    continue;
                }
            };
            if key_tx.blocking_send(path).is_err() {
                break;
            }
            listed += 1;
        }
        debug!(listed, "folder listing finished");
    });

    let root = Arc::new(root);
    let workers = spawn_workers(&pool, key_rx, result_tx, token.clone(), move |file: PathBuf| {
        let root = Arc::clone(&root);
        async move { Ok::<_, AdapterError>(read_candidate(&root, file).await) }
    });

    SbomIterator::new(
        ChannelSource::new(result_rx, token, false)
            .with_task(lister)
            .with_task(workers),
    )
}

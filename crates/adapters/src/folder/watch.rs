//! 폴더 감시: push 기반 파일 시스템 이벤트를 pull 기반 이터레이터로 중계
//!
//! 생산자 태스크 하나가 watcher 핸들을 소유하고 세 가지 입력을 기다립니다.
//!
//! ```text
//! notify 스레드 ──events──┐
//!               ──errors──┼──> producer task ──records(bounded)──> ChannelSource
//! cancel token ───────────┘
//! ```
//!
//! 이벤트 채널이나 에러 채널이 닫히거나 취소되면 생산자는 watcher를 drop하고 버퍼를 닫습니다.
//! 버퍼가 가득 차면 생산자는 enqueue에서 대기하며, 이것이 배압입니다.
//! 같은 파일이 여러 번 쓰이면 레코드가 여러 번 나올 수 있습니다.

use std::path::{Path, PathBuf};

use metrics::counter;
use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use sbomrelay_core::context::TransferContext;
use sbomrelay_core::metrics as m;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};
use walkdir::WalkDir;

use super::FolderConfig;
use crate::adapter::AdapterSettings;
use crate::error::AdapterError;
use crate::iterator::{ChannelSource, SbomIterator, SourceItem};
use crate::record::{SKIP_IO, folder_record, read_file, relative_path, skipped};

const ADAPTER: &str = "folder-watch";

/// 감시를 시작하고 이터레이터를 반환합니다.
///
/// watcher 등록은 여기서 끝나므로, 반환 이후의 변경은 모두 관찰됩니다.
/// 취소는 에러가 아니라 end-of-stream으로 보고됩니다.
pub(crate) async fn start(
    config: &FolderConfig,
    settings: &AdapterSettings,
    ctx: &TransferContext,
) -> Result<SbomIterator, AdapterError> {
    let root = tokio::fs::canonicalize(&config.path)
        .await
        .map_err(|source| AdapterError::RootUnreadable {
            path: config.path.display().to_string(),
            source,
        })?;
    if !root.is_dir() {
        return Err(watch_error(&root, "not a directory"));
    }

    let capacity = settings.watch_buffer_capacity.max(1);
    let (event_tx, event_rx) = mpsc::channel::<Event>(capacity);
    let (error_tx, error_rx) = mpsc::channel::<notify::Error>(capacity);

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        // notify 스레드에서 호출됨. 수신측이 사라졌으면 조용히 버림
        match res {
            Ok(event) => {
                let _ = event_tx.blocking_send(event);
            }
            Err(e) => {
                let _ = error_tx.blocking_send(e);
            }
        }
    })
    .map_err(|e| watch_error(&root, e))?;

    watcher
        .watch(&root, RecursiveMode::NonRecursive)
        .map_err(|e| watch_error(&root, e))?;
    if config.recursive {
        watch_tree(&mut watcher, &root).await;
    }

    let (record_tx, record_rx) = mpsc::channel::<SourceItem>(capacity);
    let token = ctx.token().child_token();

    let producer = Producer {
        watcher,
        root: root.clone(),
        recursive: config.recursive,
        out: record_tx,
        token: token.clone(),
    };
    let task = tokio::spawn(
        producer
            .run(event_rx, error_rx)
            .instrument(ctx.span().clone()),
    );

    info!(
        path = %root.display(),
        recursive = config.recursive,
        capacity,
        "folder watch started"
    );
    Ok(SbomIterator::new(
        ChannelSource::new(record_rx, token, true).with_task(task),
    ))
}

fn watch_error(path: &Path, reason: impl std::fmt::Display) -> AdapterError {
    AdapterError::Watch {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// `dir` 아래의 모든 하위 디렉토리를 비재귀로 등록합니다 (`dir` 자신 제외).
async fn watch_tree(watcher: &mut RecommendedWatcher, dir: &Path) {
    for subdir in subdirs(dir.to_path_buf()).await {
        add_watch(watcher, &subdir);
    }
}

/// 하위 디렉토리 목록. 순회는 블로킹 스레드에서 합니다.
async fn subdirs(dir: PathBuf) -> Vec<PathBuf> {
    let listing = tokio::task::spawn_blocking(move || {
        WalkDir::new(&dir)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_dir())
            .map(walkdir::DirEntry::into_path)
            .collect::<Vec<_>>()
    });
    match listing.await {
        Ok(dirs) => dirs,
        Err(e) => {
            warn!(error = %e, "directory listing task failed");
            Vec::new()
        }
    }
}

fn add_watch(watcher: &mut RecommendedWatcher, dir: &Path) {
    match watcher.watch(dir, RecursiveMode::NonRecursive) {
        Ok(()) => debug!(path = %dir.display(), "directory added to watch set"),
        Err(e) => warn!(path = %dir.display(), error = %e, "failed to watch directory"),
    }
}

/// 이 이벤트가 파일 내용을 다시 읽을 만한 변경인지
fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    )
}

/// 감시 생산자 (watcher 핸들 소유)
struct Producer {
    watcher: RecommendedWatcher,
    root: PathBuf,
    recursive: bool,
    out: mpsc::Sender<SourceItem>,
    token: CancellationToken,
}

impl Producer {
    async fn run(
        mut self,
        mut events: mpsc::Receiver<Event>,
        mut errors: mpsc::Receiver<notify::Error>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    debug!("folder watch cancelled");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        debug!("watch event channel closed");
                        break;
                    };
                    counter!(m::WATCH_EVENTS_TOTAL).increment(1);
                    if !self.handle(event).await {
                        break;
                    }
                }
                error = errors.recv() => {
                    let Some(error) = error else {
                        debug!("watch error channel closed");
                        break;
                    };
                    warn!(error = %error, "watcher reported an error");
                }
            }
        }
        // watcher를 먼저 해제해야 notify 스레드의 blocking_send가 풀림
        drop(self.watcher);
        drop(events);
        drop(errors);
        debug!(root = %self.root.display(), "folder watch producer stopped");
    }

    /// 이벤트 하나를 처리합니다. 생산을 멈춰야 하면 `false`입니다.
    async fn handle(&mut self, event: Event) -> bool {
        if !is_content_change(&event.kind) {
            return true;
        }
        let created = matches!(event.kind, EventKind::Create(_));

        for path in event.paths {
            let meta = match tokio::fs::metadata(&path).await {
                Ok(meta) => meta,
                Err(e) => {
                    // 이벤트 직후 삭제/이름 변경된 경로
                    debug!(path = %path.display(), error = %e, "event path vanished");
                    continue;
                }
            };

            if meta.is_dir() {
                if created && self.recursive {
                    add_watch(&mut self.watcher, &path);
                    watch_tree(&mut self.watcher, &path).await;
                }
                continue;
            }
            if !meta.is_file() {
                continue;
            }

            let read = tokio::select! {
                biased;
                _ = self.token.cancelled() => return false,
                read = read_file(&path) => read,
            };
            let data = match read {
                Ok(data) => data,
                Err(e) => {
                    warn!(error = %e, "failed to read file, skipping");
                    skipped(ADAPTER, SKIP_IO);
                    continue;
                }
            };

            let Some(record) = folder_record(ADAPTER, relative_path(&self.root, &path), &path, data)
            else {
                continue;
            };
            debug!(path = %record.path, namespace = %record.namespace, "watched sbom changed");

            tokio::select! {
                biased;
                _ = self.token.cancelled() => return false,
                sent = self.out.send(Ok(record)) => {
                    if sent.is_err() {
                        // 소비자가 이터레이터를 버림
                        return false;
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn content_change_kinds() {
        use notify::event::{CreateKind, DataChange, RemoveKind};

        assert!(is_content_change(&EventKind::Create(CreateKind::File)));
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Data(
            DataChange::Content
        ))));
        assert!(is_content_change(&EventKind::Access(AccessKind::Close(
            AccessMode::Write
        ))));
        assert!(!is_content_change(&EventKind::Remove(RemoveKind::File)));
        assert!(!is_content_change(&EventKind::Access(AccessKind::Read)));
    }

    #[tokio::test]
    async fn missing_root_fails_at_start() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = TransferContext::new();
        let config = FolderConfig::new(dir.path().join("gone")).watch(true);
        let err = start(&config, &AdapterSettings::default(), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::RootUnreadable { .. }));
    }

    #[tokio::test]
    async fn dropping_iterator_stops_producer() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = TransferContext::new();
        let config = FolderConfig::new(dir.path()).watch(true);
        let iter = start(&config, &AdapterSettings::default(), &ctx)
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), iter.close())
            .await
            .expect("producer should stop on close");
    }
}

//! 오브젝트 스토어 입력: 접두사 아래 오브젝트를 나열하고 SBOM만 방출
//!
//! 1. head-bucket 검사 (없음/권한 거부는 여기서 치명적)
//! 2. 접두사 목록 조회 (페이지 단위)
//! 3. 오브젝트별 본문 조회 → 분류 → 레코드
//!
//! 분류를 통과한 오브젝트가 하나도 없으면 fetch 전체가 `NoSbomsFound`로 실패합니다.
//! 이를 fetch 시점에 판정하기 위해 첫 레코드를 미리 당겨 둡니다.

use std::collections::VecDeque;
use std::sync::Arc;

use sbomrelay_core::context::TransferContext;
use sbomrelay_core::types::{ProcessingMode, SbomRecord};
use tokio::sync::mpsc;
use tracing::{Instrument, Span, debug, info, warn};

use super::client::ObjectStoreClient;
use super::config::S3Config;
use crate::adapter::AdapterSettings;
use crate::error::AdapterError;
use crate::iterator::{ChannelSource, NextResult, PrimedSource, RecordSource, SbomIterator};
use crate::pool::{PoolConfig, spawn_workers};
use crate::record::{SKIP_IO, object_record, skipped};

const ADAPTER: &str = "s3";

/// 버킷을 검사하고 레코드 스트림을 엽니다.
pub async fn fetch_records<C: ObjectStoreClient>(
    client: Arc<C>,
    config: &S3Config,
    settings: &AdapterSettings,
    ctx: &TransferContext,
) -> Result<SbomIterator, AdapterError> {
    tokio::select! {
        biased;
        _ = ctx.cancelled() => return Err(AdapterError::Cancelled),
        probed = client.head_bucket(&config.bucket) => probed?,
    }
    info!(location = %config.location(), mode = %settings.mode, "listing object store prefix");

    let primed = match settings.mode {
        ProcessingMode::Sequential => {
            let source = S3Source::new(client, config.clone());
            PrimedSource::prime(source, ctx).await?.map(SbomIterator::new)
        }
        ProcessingMode::Parallel => {
            let source = parallel(client, config.clone(), settings.parallel_workers, ctx);
            PrimedSource::prime(source, ctx).await?.map(SbomIterator::new)
        }
    };

    primed.ok_or_else(|| AdapterError::NoSbomsFound {
        location: config.location(),
    })
}

/// 오브젝트 하나를 받아 레코드로 만듭니다. 조회 실패는 로그 후 건너뜁니다.
async fn fetch_candidate<C: ObjectStoreClient>(
    client: &C,
    config: &S3Config,
    namespace: &str,
    key: &str,
) -> Option<SbomRecord> {
    match client.get_object(&config.bucket, key).await {
        Ok(body) => object_record(ADAPTER, config.relative_key(key), namespace, body),
        Err(e) => {
            warn!(key, error = %e, "failed to fetch object, skipping");
            skipped(ADAPTER, SKIP_IO);
            None
        }
    }
}

/// "디렉토리" 표시 오브젝트
fn is_folder_marker(key: &str) -> bool {
    key.ends_with('/')
}

/// sequential 소스: 목록 응답 순서대로 inline 조회
struct S3Source<C> {
    client: Arc<C>,
    config: S3Config,
    namespace: String,
    pending: VecDeque<String>,
    continuation: Option<String>,
    listed_all: bool,
}

impl<C: ObjectStoreClient> S3Source<C> {
    fn new(client: Arc<C>, config: S3Config) -> Self {
        let namespace = config.namespace();
        Self {
            client,
            config,
            namespace,
            pending: VecDeque::new(),
            continuation: None,
            listed_all: false,
        }
    }
}

impl<C: ObjectStoreClient> RecordSource for S3Source<C> {
    async fn next_record(&mut self, ctx: &TransferContext) -> NextResult {
        loop {
            if ctx.is_cancelled() {
                return Err(AdapterError::Cancelled);
            }

            let Some(key) = self.pending.pop_front() else {
                if self.listed_all {
                    return Ok(None);
                }
                let page = tokio::select! {
                    biased;
                    _ = ctx.cancelled() => return Err(AdapterError::Cancelled),
                    page = self.client.list_objects(
                        &self.config.bucket,
                        &self.config.prefix,
                        self.continuation.take(),
                    ) => page?,
                };
                debug!(keys = page.keys.len(), more = page.next_token.is_some(), "listed page");
                self.listed_all = page.next_token.is_none();
                self.continuation = page.next_token;
                self.pending.extend(page.keys);
                continue;
            };

            if is_folder_marker(&key) {
                continue;
            }

            let found = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(AdapterError::Cancelled),
                found = fetch_candidate(self.client.as_ref(), &self.config, &self.namespace, &key) => found,
            };
            if let Some(record) = found {
                return Ok(Some(record));
            }
        }
    }
}

/// parallel 소스: 목록 태스크 → 키 커서 → 워커 풀 → 결과 버퍼
///
/// 목록 조회 실패는 결과 버퍼로 전달되어 이터레이터 에러가 됩니다.
fn parallel<C: ObjectStoreClient>(
    client: Arc<C>,
    config: S3Config,
    workers: usize,
    ctx: &TransferContext,
) -> ChannelSource {
    let token = ctx.token().child_token();
    let pool = PoolConfig::with_workers(workers);
    let (key_tx, key_rx) = mpsc::channel::<String>(pool.buffer);
    let (result_tx, result_rx) = mpsc::channel(pool.buffer);
    let config = Arc::new(config);

    let lister = {
        let client = Arc::clone(&client);
        let config = Arc::clone(&config);
        let token = token.clone();
        let errors = result_tx.clone();
        async move {
            let mut continuation = None;
            loop {
                let page = tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    page = client.list_objects(&config.bucket, &config.prefix, continuation.take()) => page,
                };
                let page = match page {
                    Ok(page) => page,
                    Err(e) => {
                        tokio::select! {
                            _ = token.cancelled() => {}
                            _ = errors.send(Err(e)) => {}
                        }
                        return;
                    }
                };

                for key in page.keys.into_iter().filter(|k| !is_folder_marker(k)) {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return,
                        sent = key_tx.send(key) => {
                            if sent.is_err() {
                                return;
                            }
                        }
                    }
                }
                match page.next_token {
                    Some(next) => continuation = Some(next),
                    None => break,
                }
            }
            debug!("object listing finished");
        }
    };
    let lister = tokio::spawn(lister.instrument(Span::current()));

    let namespace = Arc::new(config.namespace());
    let workers = spawn_workers(&pool, key_rx, result_tx, token.clone(), move |key: String| {
        let client = Arc::clone(&client);
        let config = Arc::clone(&config);
        let namespace = Arc::clone(&namespace);
        async move {
            Ok::<_, AdapterError>(
                fetch_candidate(client.as_ref(), &config, &namespace, &key).await,
            )
        }
    });

    ChannelSource::new(result_rx, token, false)
        .with_task(lister)
        .with_task(workers)
}

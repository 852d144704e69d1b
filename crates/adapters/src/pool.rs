//! 제한 폭 워커 풀: parallel 처리 모드
//!
//! 하나의 키 커서(`mpsc::Receiver<K>`)를 여러 워커가 공유하고, 결과는 하나의 bounded 버퍼로 모입니다.
//! 목록 순서는 보존되지 않습니다.
//!
//! ```text
//! lister ──keys──> [cursor] ──> worker 1 ─┐
//!                          ├──> worker 2 ─┼──results──> ChannelSource
//!                          └──> worker N ─┘
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, warn};

use crate::error::AdapterError;
use crate::iterator::SourceItem;

/// 워커 풀 설정
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// 워커 수
    pub workers: usize,
    /// 결과 버퍼 용량
    pub buffer: usize,
}

impl PoolConfig {
    /// 워커 수로 설정을 만듭니다. 결과 버퍼는 워커 수의 두 배입니다.
    pub fn with_workers(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            workers,
            buffer: workers * 2,
        }
    }
}

/// 워커 풀을 시작합니다.
///
/// 각 워커는 커서에서 키를 하나씩 꺼내 `work`를 실행합니다.
/// - `Ok(Some(record))`: 결과 버퍼로 전달
/// - `Ok(None)`: 건너뜀 (SBOM이 아니거나 레코드 단위 실패)
/// - `Err(e)`: 결과 버퍼로 에러를 보내고 해당 워커 종료
///
/// 모든 워커가 끝나면 결과 송신자가 모두 drop되어 소비자는 end-of-stream을 받습니다.
pub fn spawn_workers<K, F, Fut>(
    config: &PoolConfig,
    keys: mpsc::Receiver<K>,
    results: mpsc::Sender<SourceItem>,
    cancel: CancellationToken,
    work: F,
) -> JoinHandle<()>
where
    K: Send + 'static,
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<sbomrelay_core::types::SbomRecord>, AdapterError>>
        + Send
        + 'static,
{
    let cursor = Arc::new(Mutex::new(keys));
    let work = Arc::new(work);
    let workers = config.workers;
    let span = Span::current();

    tokio::spawn(
        async move {
            let mut set = JoinSet::new();
            for id in 0..workers {
                set.spawn(worker_loop(
                    id,
                    Arc::clone(&cursor),
                    results.clone(),
                    cancel.clone(),
                    Arc::clone(&work),
                ));
            }
            drop(results);

            while let Some(joined) = set.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "pool worker panicked or was aborted");
                }
            }
            debug!(workers, "worker pool drained");
        }
        .instrument(span),
    )
}

async fn worker_loop<K, F, Fut>(
    id: usize,
    cursor: Arc<Mutex<mpsc::Receiver<K>>>,
    results: mpsc::Sender<SourceItem>,
    cancel: CancellationToken,
    work: Arc<F>,
) where
    K: Send + 'static,
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<sbomrelay_core::types::SbomRecord>, AdapterError>> + Send,
{
    loop {
        let key = tokio::select! {
            _ = cancel.cancelled() => break,
            key = async { cursor.lock().await.recv().await } => key,
        };
        let Some(key) = key else {
            break;
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => break,
            outcome = work(key) => outcome,
        };

        let item = match outcome {
            Ok(Some(record)) => Ok(record),
            Ok(None) => continue,
            Err(e) => Err(e),
        };
        let fatal = item.is_err();

        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = results.send(item) => {
                if sent.is_err() {
                    // 소비자가 사라짐
                    break;
                }
            }
        }
        if fatal {
            break;
        }
    }
    debug!(worker = id, "pool worker stopped");
}

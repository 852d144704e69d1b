//! SBOM 이터레이터: 지연 평가되는 단일 패스 레코드 스트림
//!
//! 입력 어댑터의 생산 방식(목록 조회 pull, 파일 이벤트 push)과 무관하게
//! 소비자는 [`SbomIterator::next`] 하나로 레코드를 당겨 옵니다.
//!
//! # 종료 상태
//!
//! end-of-stream이나 에러를 한 번 반환하면 이후 호출도 같은 종료 상태를 반환합니다.
//! 취소는 `Cancelled`로 유지되고, 그 밖의 에러는 `Terminated(메시지)`로 반복됩니다.
//!
//! # 생산자 종류
//!
//! - inline 소스: `next` 호출이 직접 I/O를 수행 (폴더 스캔, S3 순차)
//! - [`ChannelSource`]: 백그라운드 태스크가 bounded 버퍼에 적재 (폴더 감시, parallel 모드)

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use sbomrelay_core::context::TransferContext;
use sbomrelay_core::types::SbomRecord;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::AdapterError;

/// `next` 한 번의 결과: 레코드, end-of-stream(`None`), 또는 에러
pub type NextResult = Result<Option<SbomRecord>, AdapterError>;

/// Boxed future (dyn 호환용)
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 생산자 채널로 전달되는 항목
pub type SourceItem = Result<SbomRecord, AdapterError>;

/// 레코드 생산자
///
/// `next_record`는 `ctx`가 취소되면 생산자가 아무것도 내놓지 않았더라도 즉시 반환해야 합니다.
pub trait RecordSource: Send + 'static {
    /// 다음 레코드를 생산합니다. 끝이면 `Ok(None)`.
    fn next_record(&mut self, ctx: &TransferContext) -> impl Future<Output = NextResult> + Send;

    /// 백그라운드 자원을 정리합니다.
    fn close(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// dyn 호환 레코드 생산자
///
/// `RecordSource`는 RPITIT를 사용하므로 `dyn RecordSource`가 불가합니다.
trait DynRecordSource: Send {
    fn next_record<'a>(&'a mut self, ctx: &'a TransferContext) -> BoxFuture<'a, NextResult>;
    fn close(&mut self) -> BoxFuture<'_, ()>;
}

impl<T: RecordSource> DynRecordSource for T {
    fn next_record<'a>(&'a mut self, ctx: &'a TransferContext) -> BoxFuture<'a, NextResult> {
        Box::pin(RecordSource::next_record(self, ctx))
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(RecordSource::close(self))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum IterState {
    Active,
    Ended,
    Cancelled,
    Failed(String),
}

/// 레코드 스트림
///
/// 여러 소비자의 동시 `next` 호출은 `&mut self`로 막혀 있습니다.
pub struct SbomIterator {
    source: Box<dyn DynRecordSource>,
    state: IterState,
    yielded: u64,
}

impl SbomIterator {
    /// 생산자로 이터레이터를 만듭니다.
    pub fn new(source: impl RecordSource) -> Self {
        Self {
            source: Box::new(source),
            state: IterState::Active,
            yielded: 0,
        }
    }

    /// 바로 끝나는 이터레이터
    pub fn empty() -> Self {
        Self::from_records(Vec::new())
    }

    /// 미리 준비된 레코드로 이터레이터를 만듭니다.
    pub fn from_records(records: Vec<SbomRecord>) -> Self {
        Self::new(VecSource {
            records: records.into(),
        })
    }

    /// 다음 레코드를 가져옵니다.
    pub async fn next(&mut self, ctx: &TransferContext) -> NextResult {
        match &self.state {
            IterState::Active => {}
            IterState::Ended => return Ok(None),
            IterState::Cancelled => return Err(AdapterError::Cancelled),
            IterState::Failed(msg) => return Err(AdapterError::Terminated(msg.clone())),
        }

        let result = self.source.next_record(ctx).await;
        match &result {
            Ok(Some(_)) => self.yielded += 1,
            Ok(None) => {
                debug!(yielded = self.yielded, "iterator reached end of stream");
                self.state = IterState::Ended;
            }
            Err(AdapterError::Cancelled) => self.state = IterState::Cancelled,
            Err(e) => self.state = IterState::Failed(e.to_string()),
        }
        result
    }

    /// 지금까지 반환한 레코드 수
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    /// 종료 상태에 도달했는지
    pub fn is_finished(&self) -> bool {
        self.state != IterState::Active
    }

    /// 생산자를 멈추고 백그라운드 태스크가 끝날 때까지 기다립니다.
    ///
    /// 단순히 drop해도 생산자는 취소 신호를 받고 종료합니다.
    pub async fn close(mut self) {
        self.source.close().await;
    }
}

impl std::fmt::Debug for SbomIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SbomIterator")
            .field("state", &self.state)
            .field("yielded", &self.yielded)
            .finish_non_exhaustive()
    }
}

/// 메모리 내 레코드 소스
struct VecSource {
    records: VecDeque<SbomRecord>,
}

impl RecordSource for VecSource {
    async fn next_record(&mut self, ctx: &TransferContext) -> NextResult {
        if ctx.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        Ok(self.records.pop_front())
    }
}

/// 첫 레코드를 미리 받아 둔 소스
///
/// fetch 시점에 "하나도 없음"을 판정해야 하는 어댑터가 사용합니다.
pub struct PrimedSource<S> {
    first: Option<SbomRecord>,
    rest: S,
}

impl<S: RecordSource> PrimedSource<S> {
    /// 첫 레코드를 당겨 봅니다. 아무것도 없으면 `Ok(None)`을 반환합니다.
    pub async fn prime(mut rest: S, ctx: &TransferContext) -> Result<Option<Self>, AdapterError> {
        match rest.next_record(ctx).await {
            Ok(Some(first)) => Ok(Some(Self {
                first: Some(first),
                rest,
            })),
            Ok(None) => {
                rest.close().await;
                Ok(None)
            }
            Err(e) => {
                rest.close().await;
                Err(e)
            }
        }
    }
}

impl<S: RecordSource> RecordSource for PrimedSource<S> {
    async fn next_record(&mut self, ctx: &TransferContext) -> NextResult {
        if let Some(first) = self.first.take() {
            return Ok(Some(first));
        }
        self.rest.next_record(ctx).await
    }

    async fn close(&mut self) {
        self.rest.close().await;
    }
}

/// 백그라운드 생산자와 연결된 bounded 버퍼 소스
///
/// 생산자 태스크는 `producer_token`을 관찰합니다. 이 소스가 drop되면 토큰이 취소되어
/// 생산자가 종료됩니다.
pub struct ChannelSource {
    rx: mpsc::Receiver<SourceItem>,
    producer_token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    end_on_cancel: bool,
}

impl ChannelSource {
    /// 생산자 채널을 감쌉니다.
    ///
    /// `end_on_cancel`이 참이면 취소를 end-of-stream으로, 거짓이면 `Cancelled` 에러로 보고합니다.
    pub fn new(
        rx: mpsc::Receiver<SourceItem>,
        producer_token: CancellationToken,
        end_on_cancel: bool,
    ) -> Self {
        Self {
            rx,
            producer_token,
            tasks: Vec::new(),
            end_on_cancel,
        }
    }

    /// 종료를 기다릴 생산자 태스크를 등록합니다.
    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.tasks.push(task);
        self
    }

    fn cancelled_result(&self) -> NextResult {
        if self.end_on_cancel {
            Ok(None)
        } else {
            Err(AdapterError::Cancelled)
        }
    }
}

impl RecordSource for ChannelSource {
    async fn next_record(&mut self, ctx: &TransferContext) -> NextResult {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                self.producer_token.cancel();
                self.cancelled_result()
            }
            item = self.rx.recv() => match item {
                Some(Ok(record)) => Ok(Some(record)),
                Some(Err(e)) => Err(e),
                None if ctx.is_cancelled() => self.cancelled_result(),
                None => Ok(None),
            },
        }
    }

    async fn close(&mut self) {
        self.producer_token.cancel();
        self.rx.close();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                debug!(error = %e, "producer task ended abnormally");
            }
        }
    }
}

impl Drop for ChannelSource {
    fn drop(&mut self) {
        self.producer_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(path: &str) -> SbomRecord {
        SbomRecord::new(&b"{}"[..], path, "ns")
    }

    #[tokio::test]
    async fn vec_iterator_yields_then_stays_ended() {
        let ctx = TransferContext::new();
        let mut iter = SbomIterator::from_records(vec![record("a"), record("b")]);

        assert_eq!(iter.next(&ctx).await.unwrap().unwrap().path, "a");
        assert_eq!(iter.next(&ctx).await.unwrap().unwrap().path, "b");
        assert!(iter.next(&ctx).await.unwrap().is_none());
        assert!(iter.next(&ctx).await.unwrap().is_none());
        assert_eq!(iter.yielded(), 2);
        assert!(iter.is_finished());
    }

    struct FailingSource {
        calls: u32,
    }

    impl RecordSource for FailingSource {
        async fn next_record(&mut self, _ctx: &TransferContext) -> NextResult {
            self.calls += 1;
            Err(AdapterError::Producer(format!("boom {}", self.calls)))
        }
    }

    #[tokio::test]
    async fn error_is_sticky() {
        let ctx = TransferContext::new();
        let mut iter = SbomIterator::new(FailingSource { calls: 0 });

        let first = iter.next(&ctx).await.unwrap_err();
        assert!(first.to_string().contains("boom 1"));

        // 생산자를 다시 호출하지 않고 같은 에러를 반복
        let second = iter.next(&ctx).await.unwrap_err();
        assert!(matches!(second, AdapterError::Terminated(ref m) if m.contains("boom 1")));
    }

    #[tokio::test]
    async fn cancelled_is_sticky() {
        let ctx = TransferContext::new();
        ctx.cancel();
        let mut iter = SbomIterator::from_records(vec![record("a")]);
        assert!(matches!(iter.next(&ctx).await, Err(AdapterError::Cancelled)));
        assert!(matches!(iter.next(&ctx).await, Err(AdapterError::Cancelled)));
    }

    #[tokio::test]
    async fn channel_source_returns_promptly_on_cancel() {
        let ctx = TransferContext::new();
        let (_tx, rx) = mpsc::channel::<SourceItem>(1);
        let token = CancellationToken::new();
        let mut iter = SbomIterator::new(ChannelSource::new(rx, token.clone(), false));

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(2), iter.next(&ctx))
            .await
            .expect("next should return after cancel");
        assert!(matches!(result, Err(AdapterError::Cancelled)));
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn channel_source_end_on_cancel_reports_end_of_stream() {
        let ctx = TransferContext::new();
        let (_tx, rx) = mpsc::channel::<SourceItem>(1);
        let mut iter = SbomIterator::new(ChannelSource::new(rx, CancellationToken::new(), true));
        ctx.cancel();
        assert!(iter.next(&ctx).await.unwrap().is_none());
        assert!(iter.next(&ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn channel_source_drop_cancels_producer() {
        let (tx, rx) = mpsc::channel::<SourceItem>(1);
        let token = CancellationToken::new();
        let producer_token = token.clone();
        let producer = tokio::spawn(async move {
            producer_token.cancelled().await;
            drop(tx);
        });

        let iter = SbomIterator::new(ChannelSource::new(rx, token, false));
        drop(iter);

        tokio::time::timeout(Duration::from_secs(1), producer)
            .await
            .expect("producer should observe drop")
            .unwrap();
    }

    #[tokio::test]
    async fn primed_source_reports_empty() {
        let ctx = TransferContext::new();
        let empty = VecSource {
            records: VecDeque::new(),
        };
        assert!(PrimedSource::prime(empty, &ctx).await.unwrap().is_none());

        let one = VecSource {
            records: vec![record("x")].into(),
        };
        let primed = PrimedSource::prime(one, &ctx).await.unwrap().unwrap();
        let mut iter = SbomIterator::new(primed);
        assert_eq!(iter.next(&ctx).await.unwrap().unwrap().path, "x");
        assert!(iter.next(&ctx).await.unwrap().is_none());
    }
}

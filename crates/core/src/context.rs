//! 전송 컨텍스트: 취소 신호와 로그 태그를 모든 어댑터 진입점에 전달
//!
//! 전역 상태 대신 [`TransferContext`]를 명시적으로 넘깁니다.
//! 자식 컨텍스트는 부모가 취소되면 함께 취소되지만, 자식의 취소는 부모에 전파되지 않습니다.

use tokio_util::sync::CancellationToken;
use tracing::Span;
use uuid::Uuid;

/// 한 번의 전송 실행에 대한 컨텍스트
#[derive(Debug, Clone)]
pub struct TransferContext {
    cancel: CancellationToken,
    span: Span,
    run_id: Uuid,
}

impl TransferContext {
    /// 새 루트 컨텍스트를 생성합니다.
    pub fn new() -> Self {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("transfer", run_id = %run_id);
        Self {
            cancel: CancellationToken::new(),
            span,
            run_id,
        }
    }

    /// 어댑터 이름 태그를 가진 자식 컨텍스트를 만듭니다.
    pub fn child(&self, adapter: &str) -> Self {
        let span = tracing::info_span!(parent: &self.span, "adapter", adapter = %adapter);
        Self {
            cancel: self.cancel.child_token(),
            span,
            run_id: self.run_id,
        }
    }

    /// 실행 ID
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// 로그 태그가 담긴 span
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// 내부 취소 토큰
    ///
    /// 백그라운드 태스크에 넘길 때는 `child_token()`을 사용합니다.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// 이 컨텍스트와 모든 자식을 취소합니다.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 취소 여부
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 취소될 때까지 대기합니다.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }
}

impl Default for TransferContext {
    fn default() -> Self {
        Self::new()
    }
}

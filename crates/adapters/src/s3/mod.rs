//! S3 어댑터: 오브젝트 스토어 입력/출력
//!
//! 클라이언트는 [`client::ObjectStoreClient`] 트레이트 뒤에 있으며,
//! 운영 환경에서는 주변 자격 증명으로 만든 [`client::AwsS3Client`]를 사용합니다.

pub mod client;
pub mod config;
pub mod fetch;
pub mod output;

use std::sync::Arc;

use sbomrelay_core::context::TransferContext;
use sbomrelay_core::types::AdapterRole;

pub use client::{AwsS3Client, ObjectPage, ObjectStoreClient};
pub use config::S3Config;

use crate::adapter::{AdapterSettings, UploadSummary};
use crate::error::AdapterError;
use crate::iterator::SbomIterator;

/// S3 어댑터 이름
pub const ADAPTER_NAME: &str = "s3";

/// S3 어댑터
#[derive(Debug, Clone)]
pub struct S3Adapter {
    role: AdapterRole,
    config: S3Config,
    settings: AdapterSettings,
}

impl S3Adapter {
    /// 검증을 마친 설정으로 어댑터를 만듭니다.
    pub fn new(role: AdapterRole, config: S3Config, settings: AdapterSettings) -> Self {
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
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    async fn client(&self) -> Arc<AwsS3Client> {
        Arc::new(AwsS3Client::from_region(&self.config.region).await)
    }

    /// 입력 레코드 스트림을 엽니다.
    pub async fn fetch(&self, ctx: &TransferContext) -> Result<SbomIterator, AdapterError> {
        let client = self.client().await;
        self.fetch_with(client, ctx).await
    }

    /// 주어진 클라이언트로 입력 레코드 스트림을 엽니다.
    pub async fn fetch_with<C: ObjectStoreClient>(
        &self,
        client: Arc<C>,
        ctx: &TransferContext,
    ) -> Result<SbomIterator, AdapterError> {
        fetch::fetch_records(client, &self.config, &self.settings, ctx).await
    }

    /// 스트림의 모든 레코드를 업로드합니다.
    pub async fn upload(
        &self,
        ctx: &TransferContext,
        iter: SbomIterator,
    ) -> Result<UploadSummary, AdapterError> {
        let client = self.client().await;
        self.upload_with(client.as_ref(), ctx, iter).await
    }

    /// 주어진 클라이언트로 업로드합니다.
    pub async fn upload_with<C: ObjectStoreClient>(
        &self,
        client: &C,
        ctx: &TransferContext,
        iter: SbomIterator,
    ) -> Result<UploadSummary, AdapterError> {
        output::upload_records(client, &self.config, ctx, iter).await
    }
}

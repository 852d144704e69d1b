//! Object store API abstraction for testability.
//!
//! The [`ObjectStoreClient`] trait abstracts the S3 API, allowing production
//! code to use [`AwsS3Client`] while tests use `MockObjectStore`.
//!
//! ```text
//!   S3Adapter (fetch / upload)
//!          │
//!          ▼
//!   ObjectStoreClient (trait)
//!        │        │
//!        ▼        ▼
//!   AwsS3Client  MockObjectStore
//! ```
//!
//! Credentials are never configured here; the AWS SDK resolves them from the
//! ambient environment (env vars, profile, instance metadata).

use std::future::Future;

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::debug;

use crate::error::AdapterError;

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    /// Object keys in listing order.
    pub keys: Vec<String>,
    /// Continuation token for the next page, `None` on the last page.
    pub next_token: Option<String>,
}

/// Trait abstracting object store operations.
///
/// # Error Handling
///
/// - `head_bucket`: 404 / `NotFound` / `NoSuchBucket` become
///   `AdapterError::BucketMissing`, 403 / `AccessDenied` become
///   `AdapterError::BucketAccessDenied`
/// - everything else is wrapped as `AdapterError::ObjectStore`
pub trait ObjectStoreClient: Send + Sync + 'static {
    /// Probes that the bucket exists and is reachable.
    fn head_bucket(&self, bucket: &str) -> impl Future<Output = Result<(), AdapterError>> + Send;

    /// Lists one page of keys under `prefix`.
    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> impl Future<Output = Result<ObjectPage, AdapterError>> + Send;

    /// Fetches an object body.
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<Bytes, AdapterError>> + Send;

    /// Stores an object body, overwriting any existing object.
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
    ) -> impl Future<Output = Result<(), AdapterError>> + Send;
}

/// Maps a head-bucket failure to a readable error.
pub fn classify_bucket_error(
    code: Option<&str>,
    status: Option<u16>,
    bucket: &str,
    reason: String,
) -> AdapterError {
    match (code, status) {
        (Some("NotFound" | "NoSuchBucket"), _) | (_, Some(404)) => AdapterError::BucketMissing {
            bucket: bucket.to_owned(),
        },
        (Some("AccessDenied" | "Forbidden"), _) | (_, Some(403)) => {
            AdapterError::BucketAccessDenied {
                bucket: bucket.to_owned(),
            }
        }
        _ => AdapterError::ObjectStore {
            operation: "head_bucket",
            reason,
        },
    }
}

/// Production client backed by `aws-sdk-s3`.
#[derive(Debug, Clone)]
pub struct AwsS3Client {
    client: aws_sdk_s3::Client,
}

impl AwsS3Client {
    /// Builds a client for `region` with ambient credentials.
    pub async fn from_region(region: &str) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_owned()))
            .load()
            .await;
        debug!(region, "s3 client configured");
        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
        }
    }
}

fn store_error(operation: &'static str, err: impl std::error::Error) -> AdapterError {
    AdapterError::ObjectStore {
        operation,
        reason: DisplayErrorContext(err).to_string(),
    }
}

impl ObjectStoreClient for AwsS3Client {
    async fn head_bucket(&self, bucket: &str) -> Result<(), AdapterError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let status = e.raw_response().map(|r| r.status().as_u16());
                let code = e.code().map(str::to_owned);
                let reason = DisplayErrorContext(e).to_string();
                Err(classify_bucket_error(code.as_deref(), status, bucket, reason))
            }
        }
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ObjectPage, AdapterError> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|e| store_error("list_objects", e))?;

        let keys = resp
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(str::to_owned))
            .collect();
        let next_token = if resp.is_truncated().unwrap_or(false) {
            resp.next_continuation_token().map(str::to_owned)
        } else {
            None
        };
        Ok(ObjectPage { keys, next_token })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, AdapterError> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| store_error("get_object", e))?;
        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| store_error("get_object", e))?;
        Ok(body.into_bytes())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), AdapterError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| store_error("put_object", e))?;
        Ok(())
    }
}

/// 테스트용 Mock 오브젝트 스토어
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockObjectStore {
    objects: std::sync::Mutex<std::collections::BTreeMap<String, Bytes>>,
    page_size: usize,
    missing: bool,
    denied: bool,
    failing_keys: std::collections::BTreeSet<String>,
}

#[cfg(test)]
impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            page_size: 1000,
            ..Self::default()
        }
    }

    pub fn with_object(self, key: &str, body: &[u8]) -> Self {
        self.insert(key, Bytes::copy_from_slice(body));
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn missing_bucket(mut self) -> Self {
        self.missing = true;
        self
    }

    pub fn denied_bucket(mut self) -> Self {
        self.denied = true;
        self
    }

    pub fn failing_get(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_owned());
        self
    }

    pub fn insert(&self, key: &str, body: Bytes) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_owned(), body);
    }

    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[cfg(test)]
impl ObjectStoreClient for MockObjectStore {
    async fn head_bucket(&self, bucket: &str) -> Result<(), AdapterError> {
        if self.missing {
            return Err(classify_bucket_error(Some("NotFound"), Some(404), bucket, String::new()));
        }
        if self.denied {
            return Err(classify_bucket_error(Some("AccessDenied"), Some(403), bucket, String::new()));
        }
        Ok(())
    }

    async fn list_objects(
        &self,
        _bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ObjectPage, AdapterError> {
        let objects = self.objects.lock().unwrap();
        let mut matching = objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .filter(|k| continuation.as_ref().is_none_or(|after| *k > after));
        let keys: Vec<String> = matching.by_ref().take(self.page_size).cloned().collect();
        let next_token = if matching.next().is_some() {
            keys.last().cloned()
        } else {
            None
        };
        Ok(ObjectPage { keys, next_token })
    }

    async fn get_object(&self, _bucket: &str, key: &str) -> Result<Bytes, AdapterError> {
        if self.failing_keys.contains(key) {
            return Err(AdapterError::ObjectStore {
                operation: "get_object",
                reason: format!("injected failure for {key}"),
            });
        }
        self.object(key).ok_or_else(|| AdapterError::ObjectStore {
            operation: "get_object",
            reason: format!("NoSuchKey: {key}"),
        })
    }

    async fn put_object(&self, _bucket: &str, key: &str, body: Bytes) -> Result<(), AdapterError> {
        self.insert(key, body);
        Ok(())
    }
}

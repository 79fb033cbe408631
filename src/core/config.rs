//! Process environment and remote configuration.
//!
//! Secrets live in a single JSON object in a bucket; `ConfigStore` downloads
//! it once and serves individual keys from the cached map for the rest of the
//! process lifetime. There is no refresh path.

use std::collections::HashMap;
use std::env;

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use tokio::sync::OnceCell;

use crate::errors::NotifyError;

/// Configuration read from the process environment at startup.
///
/// `LOG_LEVEL` is consumed separately by `setup_logging`.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub vars_bucket: String,
    pub vars_object: String,
    pub error_report_url: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            vars_bucket: env::var("VARS_BUCKET").map_err(|e| format!("VARS_BUCKET: {e}"))?,
            vars_object: env::var("VARS_OBJECT").map_err(|e| format!("VARS_OBJECT: {e}"))?,
            error_report_url: env::var("ERROR_REPORT_URL").ok(),
        })
    }
}

/// Downloads one named object from one named bucket.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    async fn fetch(&self, bucket: &str, object: &str) -> Result<Vec<u8>, NotifyError>;
}

/// Production fetcher backed by S3 `GetObject`.
pub struct S3BlobFetcher {
    client: S3Client,
}

impl S3BlobFetcher {
    #[must_use]
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    pub async fn from_env() -> Self {
        let shared = aws_config::from_env().load().await;
        Self::new(S3Client::new(&shared))
    }
}

#[async_trait]
impl BlobFetcher for S3BlobFetcher {
    async fn fetch(&self, bucket: &str, object: &str) -> Result<Vec<u8>, NotifyError> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(object)
            .send()
            .await
            .map_err(|e| {
                NotifyError::ConfigUnavailable(format!("s3 get_object {bucket}/{object}: {e}"))
            })?;

        let bytes = resp.body.collect().await.map_err(|e| {
            NotifyError::ConfigUnavailable(format!("s3 body read {bucket}/{object}: {e}"))
        })?;
        Ok(bytes.into_bytes().to_vec())
    }
}

/// Memoizing view over the remote config blob.
///
/// The first successful `all()` caches the parsed map; every later call, and
/// every `get()`, reads the cache without touching the backend again.
pub struct ConfigStore {
    fetcher: Box<dyn BlobFetcher>,
    bucket: String,
    object: String,
    cache: OnceCell<HashMap<String, String>>,
}

impl ConfigStore {
    pub fn new(fetcher: Box<dyn BlobFetcher>, bucket: &str, object: &str) -> Self {
        Self {
            fetcher,
            bucket: bucket.to_string(),
            object: object.to_string(),
            cache: OnceCell::new(),
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigUnavailable` if the blob cannot be downloaded or is not
    /// a flat JSON object of strings.
    pub async fn all(&self) -> Result<&HashMap<String, String>, NotifyError> {
        self.cache
            .get_or_try_init(|| async {
                let raw = self.fetcher.fetch(&self.bucket, &self.object).await?;
                serde_json::from_slice::<HashMap<String, String>>(&raw).map_err(|e| {
                    NotifyError::ConfigUnavailable(format!(
                        "config blob {}/{} is not a flat JSON string map: {e}",
                        self.bucket, self.object
                    ))
                })
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `ConfigKeyMissing` if the blob loaded but lacks `key`, or the
    /// fetch error if the blob itself is unavailable.
    pub async fn get(&self, key: &str) -> Result<String, NotifyError> {
        self.all()
            .await?
            .get(key)
            .cloned()
            .ok_or_else(|| NotifyError::ConfigKeyMissing(key.to_string()))
    }
}

//! Bucket construction.
//!
//! Maps a validated [`BucketConfig`] to an `Arc<dyn ObjectStore>` handle.
//! The backends themselves (local filesystem, S3, in-memory) come from the
//! `object_store` crate; this module only validates options and applies the
//! optional logical prefix. Retry behavior is the store's concern, not ours.

use std::path::PathBuf;
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::prefix::PrefixStore;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_S3_REGION: &str = "us-east-1";

/// Which backend to construct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BucketProvider {
    /// Filesystem-backed bucket rooted at `path`.
    Local { path: PathBuf },
    /// S3-compatible bucket. `region` defaults to `us-east-1`; a custom
    /// `endpoint` (MinIO, localstack) enables plain-HTTP access.
    S3 {
        bucket: String,
        key: String,
        secret: String,
        #[serde(default)]
        region: String,
        #[serde(default)]
        endpoint: Option<String>,
    },
    /// In-process bucket, useful for tests.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketConfig {
    pub provider: BucketProvider,

    /// Logical prefix applied to every key in the bucket.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl BucketConfig {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            provider: BucketProvider::Local { path: path.into() },
            prefix: None,
        }
    }

    pub fn memory() -> Self {
        Self {
            provider: BucketProvider::Memory,
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    fn validate(&self) -> Result<()> {
        if let BucketProvider::S3 {
            bucket, key, secret, ..
        } = &self.provider
        {
            if bucket.is_empty() {
                return Err(Error::invalid("must specify an S3 bucket name"));
            }
            if key.is_empty() {
                return Err(Error::invalid("must specify an S3 access key"));
            }
            if secret.is_empty() {
                return Err(Error::invalid("must specify an S3 secret"));
            }
        }
        Ok(())
    }
}

/// Construct the configured bucket.
pub fn open_bucket(config: &BucketConfig) -> Result<Arc<dyn ObjectStore>> {
    config.validate()?;

    let store = match &config.provider {
        BucketProvider::Local { path } => {
            let store =
                LocalFileSystem::new_with_prefix(path).map_err(|e| Error::storage("open", e))?;
            apply_prefix(store, &config.prefix)
        }
        BucketProvider::S3 {
            bucket,
            key,
            secret,
            region,
            endpoint,
        } => {
            let region = if region.is_empty() {
                DEFAULT_S3_REGION
            } else {
                region.as_str()
            };
            let mut builder = AmazonS3Builder::new()
                .with_bucket_name(bucket.as_str())
                .with_region(region)
                .with_access_key_id(key.as_str())
                .with_secret_access_key(secret.as_str());
            if let Some(endpoint) = endpoint {
                builder = builder.with_endpoint(endpoint.as_str()).with_allow_http(true);
            }
            let store = builder.build().map_err(|e| Error::storage("open", e))?;
            apply_prefix(store, &config.prefix)
        }
        BucketProvider::Memory => apply_prefix(InMemory::new(), &config.prefix),
    };

    Ok(store)
}

fn apply_prefix<T: ObjectStore>(store: T, prefix: &Option<String>) -> Arc<dyn ObjectStore> {
    match prefix {
        Some(prefix) if !prefix.is_empty() => Arc::new(PrefixStore::new(store, prefix.as_str())),
        _ => Arc::new(store),
    }
}

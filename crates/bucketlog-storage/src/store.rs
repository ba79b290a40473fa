//! Chunk store facade.
//!
//! [`ChunkStore`] is the top-level handle tying the pieces together: an
//! object store plus an encoder. It exposes the one-shot operations
//! (`write`, `write_bytes`, `add_metadata`) and constructs the stateful
//! collaborators (`writer`, `sender`, `reader`, `follow_file`).
//!
//! Every operation takes an options struct that validates before any I/O.
//!
//! ## Usage
//!
//! ```ignore
//! let bucket = open_bucket(&BucketConfig::local("/var/lib/bucketlog"))?;
//! let store = ChunkStore::new(bucket);
//!
//! // One value, one chunk.
//! store.write(WriteOptions {
//!     key: "task/42".to_string(),
//!     data: json!({"event": "started"}),
//!     encoding: JSON.to_string(),
//! }).await?;
//!
//! // Read the whole stream back, oldest chunk first.
//! let mut reader = store.reader(ReadOptions::forward("task/42")).await?;
//! let raw = reader.read_to_end().await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use object_store::path::Path;
use object_store::ObjectStore;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use bucketlog_core::key;
use bucketlog_encoding::CodecRegistry;

use crate::config::TailConfig;
use crate::encode::Encoder;
use crate::error::{Error, Result};
use crate::reader::ChunkReader;
use crate::sender::{BucketSender, SenderOptions};
use crate::tail;
use crate::writer::{BucketWriter, WriterOptions};

/// Name of the fixed metadata object stored beside a prefix's chunks.
pub const METADATA_NAME: &str = "metadata";

/// True for the metadata object (with or without a codec extension).
pub(crate) fn is_metadata_key(key: &str) -> bool {
    let name = key.rsplit('/').next().unwrap_or(key);
    name == METADATA_NAME || name.starts_with("metadata.")
}

/// Options for [`ChunkStore::write`].
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Key prefix the chunk lives under.
    pub key: String,
    pub data: Value,
    /// Codec name; empty resolves to plain text.
    pub encoding: String,
}

impl WriteOptions {
    fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::invalid("must specify a key"));
        }
        if self.data.is_null() {
            return Err(Error::invalid("data cannot be null"));
        }
        Ok(())
    }
}

/// Options for [`ChunkStore::write_bytes`].
#[derive(Debug, Clone)]
pub struct WriteBytesOptions {
    pub key: String,
    pub data: Bytes,
    /// Codec name, used only for the chunk key's extension.
    pub encoding: String,
}

impl WriteBytesOptions {
    fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::invalid("must specify a key"));
        }
        if self.data.is_empty() {
            return Err(Error::invalid("data cannot be empty"));
        }
        Ok(())
    }
}

/// Options for [`ChunkStore::add_metadata`].
#[derive(Debug, Clone)]
pub struct AddMetadataOptions {
    pub key: String,
    pub data: Value,
    pub encoding: String,
}

/// Options for [`ChunkStore::reader`].
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub key: String,
    /// Newest chunk first.
    pub reverse: bool,
}

impl ReadOptions {
    pub fn forward(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reverse: false,
        }
    }

    pub fn reverse(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reverse: true,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::invalid("must specify a key"));
        }
        Ok(())
    }
}

/// Options for [`ChunkStore::follow_file`].
#[derive(Debug, Clone)]
pub struct FollowOptions {
    pub key: String,
    /// File to follow.
    pub path: PathBuf,
    /// Codec name, used only for chunk key extensions.
    pub encoding: String,
    pub config: TailConfig,
}

impl FollowOptions {
    fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::invalid("must specify a key"));
        }
        if self.path.as_os_str().is_empty() {
            return Err(Error::invalid("must specify a file path"));
        }
        Ok(())
    }
}

/// Top-level handle over a bucket: one-shot chunk operations plus
/// constructors for the stateful collaborators.
#[derive(Clone)]
pub struct ChunkStore {
    store: Arc<dyn ObjectStore>,
    encoder: Encoder,
}

impl ChunkStore {
    /// A store with the default codec registry (`plain_text`, `json`).
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            encoder: Encoder::default(),
        }
    }

    /// A store with an explicit codec registry.
    pub fn with_registry(store: Arc<dyn ObjectStore>, registry: Arc<CodecRegistry>) -> Self {
        Self {
            store,
            encoder: Encoder::new(registry),
        }
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Marshal one value and persist it as exactly one chunk.
    pub async fn write(&self, options: WriteOptions) -> Result<()> {
        options.validate()?;
        let (chunk_key, data) = self
            .encoder
            .encode(&options.data, &options.key, &options.encoding)?;
        self.put(&chunk_key, data.into()).await
    }

    /// Persist pre-encoded bytes as exactly one chunk.
    pub async fn write_bytes(&self, options: WriteBytesOptions) -> Result<()> {
        options.validate()?;
        let codec = self.encoder.resolve(&options.encoding)?;
        let chunk_key = key::chunk_key(&options.key, codec.extension());
        self.put(&chunk_key, options.data).await
    }

    /// Marshal a metadata value under the fixed `<key>/metadata` object.
    ///
    /// Overwrites any previous metadata. The object is not part of the
    /// record stream; readers skip it.
    pub async fn add_metadata(&self, options: AddMetadataOptions) -> Result<()> {
        if options.key.is_empty() {
            return Err(Error::invalid("must specify a key"));
        }
        let codec = self.encoder.resolve(&options.encoding)?;
        let data = codec.marshal(&options.data)?;

        let name = match codec.extension() {
            "" => METADATA_NAME.to_string(),
            ext => format!("{}.{}", METADATA_NAME, ext),
        };
        let chunk_key = format!("{}/{}", options.key.trim_end_matches('/'), name);
        self.put(&chunk_key, data.into()).await
    }

    /// Construct a buffered writer rooted at `options.key`.
    pub fn writer(&self, options: WriterOptions) -> Result<BucketWriter> {
        BucketWriter::new(self.store.clone(), self.encoder.clone(), options)
    }

    /// Construct a leveled sender rooted at `options.key`.
    pub fn sender(&self, options: SenderOptions) -> Result<BucketSender> {
        BucketSender::new(self.store.clone(), self.encoder.clone(), options)
    }

    /// Open a reader over the chunks under `options.key`.
    pub async fn reader(&self, options: ReadOptions) -> Result<ChunkReader> {
        options.validate()?;
        ChunkReader::open(self.store.clone(), &options.key, options.reverse).await
    }

    /// Follow a growing file, forwarding its lines as raw chunks until
    /// `cancel` fires. See the `tail` module for the loss semantics at
    /// cancellation.
    pub async fn follow_file(
        &self,
        options: FollowOptions,
        cancel: CancellationToken,
    ) -> Result<()> {
        options.validate()?;
        tail::follow(self, &options, cancel).await
    }

    async fn put(&self, chunk_key: &str, data: Bytes) -> Result<()> {
        let size = data.len();
        let path = Path::from(chunk_key);
        self.store
            .put(&path, data)
            .await
            .map_err(|e| Error::storage("put", e))?;
        tracing::debug!(key = %chunk_key, bytes = size, "wrote chunk");
        Ok(())
    }
}

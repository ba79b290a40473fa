//! Chunk reader.
//!
//! Reconstructs the original record stream from the chunks a writer
//! persisted.
//!
//! ## Read flow
//!
//! ```text
//! open(prefix)
//!     ↓
//! store.list(prefix)   ← collect every chunk key
//!     ↓
//! sort_keys()          ← chronological (or reversed)
//!     ↓
//! read(buf)            ← lazily fetch chunk 1, 2, ... as bytes drain
//!     ↓
//! Ok(0)                ← all chunks exhausted
//! ```
//!
//! `read` flattens chunk boundaries into one continuous byte stream;
//! `read_page` keeps them visible, yielding one chunk's content at a time.
//! A chunk that fails to fetch aborts the read immediately - skipping it
//! would silently hole the stream - and the reader is not resumable past
//! the failure.

use std::sync::Arc;

use bytes::{Buf, Bytes};
use futures::StreamExt;
use object_store::path::Path;
use object_store::ObjectStore;

use bucketlog_core::key;

use crate::error::{Error, Result};
use crate::store::is_metadata_key;

/// Reads the chunks under one key prefix as a single stream.
pub struct ChunkReader {
    store: Arc<dyn ObjectStore>,
    keys: Vec<String>,
    next_key: usize,
    current: Option<Bytes>,
}

impl ChunkReader {
    /// List and sort every chunk key under `key_prefix`.
    ///
    /// `reverse` yields newest-first order. The metadata object, if any, is
    /// not part of the record stream and is skipped.
    pub async fn open(
        store: Arc<dyn ObjectStore>,
        key_prefix: &str,
        reverse: bool,
    ) -> Result<Self> {
        let prefix_path = if key_prefix.is_empty() {
            None
        } else {
            Some(Path::from(key_prefix))
        };

        let mut keys = Vec::new();
        {
            let mut listing = store.list(prefix_path.as_ref());
            while let Some(meta) = listing.next().await {
                let meta = meta.map_err(|e| Error::storage("list", e))?;
                keys.push(meta.location.to_string());
            }
        }
        keys.retain(|k| !is_metadata_key(k));
        key::sort_keys(&mut keys, reverse);

        tracing::debug!(
            prefix = %key_prefix,
            chunks = keys.len(),
            reverse,
            "opened chunk reader"
        );

        Ok(Self {
            store,
            keys,
            next_key: 0,
            current: None,
        })
    }

    /// Fill `buf` from the stream, advancing across chunk boundaries.
    ///
    /// Returns the number of bytes written; `Ok(0)` signals end of stream
    /// once every chunk is exhausted (or `buf` is empty).
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut offset = 0;
        while offset < buf.len() {
            if self.current.as_ref().map_or(true, |c| c.is_empty()) && !self.advance().await? {
                break;
            }
            if let Some(current) = self.current.as_mut() {
                let n = current.len().min(buf.len() - offset);
                buf[offset..offset + n].copy_from_slice(&current[..n]);
                current.advance(n);
                offset += n;
            }
        }
        Ok(offset)
    }

    /// The current chunk's remaining content as one unit, keeping chunk
    /// boundaries visible. `None` once every chunk is exhausted.
    pub async fn read_page(&mut self) -> Result<Option<Bytes>> {
        if self.current.as_ref().map_or(true, |c| c.is_empty()) && !self.advance().await? {
            return Ok(None);
        }
        Ok(self.current.take())
    }

    /// Drain the remaining stream into one buffer.
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(page) = self.read_page().await? {
            out.extend_from_slice(&page);
        }
        Ok(out)
    }

    /// Release the currently open chunk. Idempotent; a no-op before any
    /// read.
    pub fn close(&mut self) {
        self.current = None;
    }

    /// The sorted chunk keys this reader will visit.
    pub fn chunk_keys(&self) -> &[String] {
        &self.keys
    }

    /// Fetch the next chunk in sorted order. False when exhausted.
    async fn advance(&mut self) -> Result<bool> {
        self.current = None;
        if self.next_key == self.keys.len() {
            return Ok(false);
        }

        let chunk_key = self.keys[self.next_key].clone();
        let path = Path::from(chunk_key.as_str());
        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| Error::ChunkFetch {
                key: chunk_key.clone(),
                source: e,
            })?;
        let data = result.bytes().await.map_err(|e| Error::ChunkFetch {
            key: chunk_key.clone(),
            source: e,
        })?;

        tracing::trace!(key = %chunk_key, bytes = data.len(), "fetched chunk");

        self.current = Some(data);
        self.next_key += 1;
        Ok(true)
    }
}

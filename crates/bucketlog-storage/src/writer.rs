//! Buffered chunk writer.
//!
//! This module implements the core write path: records accumulate in
//! memory and are persisted as discrete, time-ordered chunks.
//!
//! ## Write flow
//!
//! ```text
//! append(record)
//!     ↓
//! Buffer              ← in-memory, under the writer's lock
//!     ↓
//! size >= max? ── or timer tick ── or close()
//!     ↓ YES
//! render buffer       ← one encoded unit (or raw concatenation)
//!     ↓
//! chunk_key()         ← fresh sortable key
//!     ↓
//! store.put()         ← exactly one chunk per flush
//! ```
//!
//! ## Flush triggers
//!
//! One flush implementation, three triggers:
//!
//! - **Size**: an append that brings the buffer to `max_buffer_size`
//!   flushes synchronously before returning.
//! - **Timer**: a background task flushes a non-empty buffer once per
//!   `flush_interval`; its failures go to the local fallback sender, since
//!   there is no caller to surface them to.
//! - **Close**: the first `close()` best-effort-flushes the remainder,
//!   then stops the timer task. Later closes are no-ops.
//!
//! ## Locking
//!
//! All buffer and lifecycle mutation happens under one `tokio::sync::Mutex`.
//! The blob-store put runs while holding that lock, which serializes appends
//! during a flush: the buffer snapshot is atomic and records are never split
//! across chunks non-deterministically.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use object_store::path::Path;
use object_store::ObjectStore;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use bucketlog_core::key;
use bucketlog_core::line::{render_value, LogLine, Message};
use bucketlog_core::priority::Priority;
use bucketlog_core::sender::{Sender, TracingSender};
use bucketlog_encoding::{Codec, EncodingError};

use crate::config::WriterConfig;
use crate::encode::Encoder;
use crate::error::{Error, Result};

/// One buffered element.
///
/// A closed set: a generic value destined for codec marshal, a pre-encoded
/// payload written verbatim, or a structured log line.
#[derive(Debug, Clone)]
pub(crate) enum Entry {
    Value(Value),
    Raw(Bytes),
    Line(LogLine),
}

impl Entry {
    /// Size of the representation that will actually be transmitted, so the
    /// threshold check matches what a flush really uploads.
    fn transmitted_size(&self) -> usize {
        match self {
            Entry::Raw(data) => data.len(),
            Entry::Value(value) => render_value(value).len(),
            Entry::Line(line) => line.rendered().len(),
        }
    }
}

struct Buffer {
    entries: Vec<Entry>,
    size: usize,
    last_flush: Instant,
    closed: bool,
}

impl Buffer {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            size: 0,
            last_flush: Instant::now(),
            closed: false,
        }
    }
}

/// Construction options for [`BucketWriter`].
pub struct WriterOptions {
    /// Key prefix all of this writer's chunks live under. Required.
    pub key: String,

    /// Codec name for rendering structured entries. Empty resolves to
    /// plain text.
    pub encoding: String,

    pub config: WriterConfig,

    /// Fallback sender for errors with no caller to surface to. Defaults
    /// to a [`TracingSender`].
    pub local: Option<Arc<dyn Sender>>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            key: String::new(),
            encoding: String::new(),
            config: WriterConfig::default(),
            local: None,
        }
    }
}

/// State shared between the writer handle and its periodic flush task.
struct Shared {
    buffer: Mutex<Buffer>,
    store: Arc<dyn ObjectStore>,
    encoder: Encoder,
    key_prefix: String,
    encoding: String,
    config: WriterConfig,
    local: Arc<dyn Sender>,
}

impl Shared {
    async fn push(&self, entry: Entry) -> Result<()> {
        let mut buffer = self.buffer.lock().await;
        if buffer.closed {
            return Err(Error::ClosedWriter);
        }

        buffer.size += entry.transmitted_size();
        buffer.entries.push(entry);

        if buffer.size >= self.config.max_buffer_size {
            // Threshold flush happens before the triggering append returns.
            // On failure the buffer stays intact and the error surfaces to
            // the caller; a later flush can retry.
            self.flush_locked(&mut buffer).await?;
        }
        Ok(())
    }

    /// Persist the entire buffer as exactly one chunk, then clear it.
    ///
    /// Caller holds the buffer lock. On failure the buffer is left intact.
    async fn flush_locked(&self, buffer: &mut Buffer) -> Result<()> {
        if buffer.entries.is_empty() {
            return Ok(());
        }

        let codec = self.encoder.resolve(&self.encoding)?;
        let data = render_entries(&buffer.entries, codec.as_ref())?;
        let chunk_key = key::chunk_key(&self.key_prefix, codec.extension());
        let size = data.len();

        let path = Path::from(chunk_key.as_str());
        self.store
            .put(&path, Bytes::from(data))
            .await
            .map_err(|e| Error::storage("put", e))?;

        tracing::debug!(
            key = %chunk_key,
            entries = buffer.entries.len(),
            bytes = size,
            "flushed buffer to bucket"
        );

        buffer.entries.clear();
        buffer.size = 0;
        buffer.last_flush = Instant::now();
        Ok(())
    }

    async fn timed_flush(&self) {
        let mut buffer = self.buffer.lock().await;
        if buffer.closed || buffer.entries.is_empty() {
            return;
        }
        if buffer.last_flush.elapsed() < self.config.flush_interval {
            return;
        }
        if let Err(err) = self.flush_locked(&mut buffer).await {
            tracing::warn!(key = %self.key_prefix, error = %err, "periodic flush failed");
            self.local
                .send(Message::new(
                    Priority::Error,
                    format!("periodic flush for '{}' failed: {}", self.key_prefix, err),
                ))
                .await;
        }
    }
}

/// Render the buffer into the bytes of one chunk.
///
/// A buffer of only raw entries concatenates verbatim; any buffer holding
/// structured entries marshals as one unit through the codec (one JSON
/// array for the `json` codec), with raw entries surfacing as their UTF-8
/// string form.
fn render_entries(entries: &[Entry], codec: &dyn Codec) -> Result<Vec<u8>> {
    if entries.iter().all(|e| matches!(e, Entry::Raw(_))) {
        let total: usize = entries.iter().map(|e| e.transmitted_size()).sum();
        let mut out = Vec::with_capacity(total);
        for entry in entries {
            if let Entry::Raw(data) = entry {
                out.extend_from_slice(data);
            }
        }
        return Ok(out);
    }

    let mut values = Vec::with_capacity(entries.len());
    for entry in entries {
        values.push(match entry {
            Entry::Value(value) => value.clone(),
            Entry::Raw(data) => Value::String(String::from_utf8_lossy(data).into_owned()),
            Entry::Line(line) => {
                serde_json::to_value(line).map_err(|e| EncodingError::Marshal {
                    codec: codec.name().to_string(),
                    reason: e.to_string(),
                })?
            }
        });
    }
    Ok(codec.marshal(&Value::Array(values))?)
}

/// Buffered writer persisting records as time-ordered chunks.
///
/// # Lifecycle
///
/// A writer is open from construction until [`close`](Self::close). A
/// closed writer rejects appends with [`Error::ClosedWriter`]; closing
/// again is a no-op. The transition is one-way.
///
/// # Example
///
/// ```ignore
/// let writer = BucketWriter::new(store, Encoder::default(), WriterOptions {
///     key: "task/42".to_string(),
///     encoding: bucketlog_encoding::JSON.to_string(),
///     ..Default::default()
/// })?;
///
/// writer.append(&event).await?;
/// writer.close().await?;
/// ```
pub struct BucketWriter {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    flush_task: Mutex<Option<JoinHandle<()>>>,
}

impl BucketWriter {
    /// Create a writer rooted at `options.key` and start its periodic
    /// flush task (unless the configured interval is zero).
    pub fn new(
        store: Arc<dyn ObjectStore>,
        encoder: Encoder,
        options: WriterOptions,
    ) -> Result<Self> {
        if options.key.is_empty() {
            return Err(Error::invalid("must specify a key prefix"));
        }

        let local = options
            .local
            .unwrap_or_else(|| Arc::new(TracingSender::new("local")));

        let shared = Arc::new(Shared {
            buffer: Mutex::new(Buffer::new()),
            store,
            encoder,
            key_prefix: options.key,
            encoding: options.encoding,
            config: options.config,
            local,
        });

        let cancel = CancellationToken::new();
        let flush_task = if shared.config.flush_interval.is_zero() {
            None
        } else {
            Some(tokio::spawn(run_periodic_flush(
                shared.clone(),
                cancel.clone(),
            )))
        };

        Ok(Self {
            shared,
            cancel,
            flush_task: Mutex::new(flush_task),
        })
    }

    /// Buffer a generic value for codec marshal at flush time.
    pub async fn append<T>(&self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let codec = self.shared.encoder.resolve(&self.shared.encoding)?;
        let value = serde_json::to_value(value).map_err(|e| EncodingError::Marshal {
            codec: codec.name().to_string(),
            reason: e.to_string(),
        })?;
        self.shared.push(Entry::Value(value)).await
    }

    /// Buffer a pre-encoded payload, written verbatim at flush time.
    pub async fn append_bytes(&self, data: impl Into<Bytes>) -> Result<()> {
        self.shared.push(Entry::Raw(data.into())).await
    }

    /// Buffer a structured log line.
    pub async fn append_line(&self, line: LogLine) -> Result<()> {
        self.shared.push(Entry::Line(line)).await
    }

    /// Explicit flush. A no-op success when closed or empty.
    pub async fn flush(&self) -> Result<()> {
        let mut buffer = self.shared.buffer.lock().await;
        if buffer.closed {
            return Ok(());
        }
        self.shared.flush_locked(&mut buffer).await
    }

    /// Close the writer: best-effort flush of the remainder, then stop the
    /// periodic flush task.
    ///
    /// A close-time flush failure is routed to the local fallback sender
    /// and returned, but the writer still transitions to closed. Later
    /// calls return `Ok(())` without flushing again.
    pub async fn close(&self) -> Result<()> {
        let result = {
            let mut buffer = self.shared.buffer.lock().await;
            if buffer.closed {
                return Ok(());
            }
            buffer.closed = true;

            match self.shared.flush_locked(&mut buffer).await {
                Ok(()) => Ok(()),
                Err(err) => {
                    self.shared
                        .local
                        .send(Message::new(
                            Priority::Error,
                            format!(
                                "flushing '{}' on close failed: {}",
                                self.shared.key_prefix, err
                            ),
                        ))
                        .await;
                    Err(err)
                }
            }
        };

        self.cancel.cancel();
        if let Some(task) = self.flush_task.lock().await.take() {
            if task.await.is_err() {
                tracing::warn!(key = %self.shared.key_prefix, "periodic flush task panicked");
            }
        }

        result
    }

    /// Number of buffered entries. Primarily for inspection in tests.
    pub async fn buffered_len(&self) -> usize {
        self.shared.buffer.lock().await.entries.len()
    }

    /// Accumulated transmitted size of the buffer, in bytes.
    pub async fn buffered_size(&self) -> usize {
        self.shared.buffer.lock().await.size
    }

    pub async fn is_closed(&self) -> bool {
        self.shared.buffer.lock().await.closed
    }
}

async fn run_periodic_flush(shared: Arc<Shared>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(shared.config.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; consume it so the loop waits a
    // full interval before the first timed flush.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(key = %shared.key_prefix, "periodic flush task stopped");
                return;
            }
            _ = ticker.tick() => {
                shared.timed_flush().await;
            }
        }
    }
}

//! Sender integration.
//!
//! [`BucketSender`] implements the core [`Sender`] capability over a
//! [`BucketWriter`], so a generic leveled-logging framework can log
//! straight into chunk storage. Messages below the configured threshold
//! are dropped; accepted messages become [`LogLine`]s stamped at send
//! time and flush as one JSON array per chunk.
//!
//! `send` never fails: a closed writer or a failed threshold flush routes
//! an error message to the local fallback sender instead, so the record
//! stays observable even when it is lost from durable storage.

use std::sync::Arc;

use async_trait::async_trait;
use object_store::ObjectStore;

use bucketlog_core::line::{LogLine, Message};
use bucketlog_core::priority::Priority;
use bucketlog_core::sender::{Sender, SinkError, TracingSender};
use bucketlog_encoding::JSON;

use crate::config::WriterConfig;
use crate::encode::Encoder;
use crate::error::Result;
use crate::writer::{BucketWriter, WriterOptions};

/// Construction options for [`BucketSender`].
pub struct SenderOptions {
    /// Key prefix the sender's chunks live under. Required; doubles as the
    /// sender's name.
    pub key: String,

    /// Minimum priority a message must carry to be accepted.
    pub threshold: Priority,

    pub config: WriterConfig,

    /// Fallback sender for errors with no caller to surface to. Defaults
    /// to a [`TracingSender`].
    pub local: Option<Arc<dyn Sender>>,
}

impl Default for SenderOptions {
    fn default() -> Self {
        Self {
            key: String::new(),
            threshold: Priority::default(),
            config: WriterConfig::default(),
            local: None,
        }
    }
}

/// A leveled sink persisting accepted messages as chunked log lines.
pub struct BucketSender {
    name: String,
    threshold: Priority,
    writer: BucketWriter,
    local: Arc<dyn Sender>,
}

impl BucketSender {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        encoder: Encoder,
        options: SenderOptions,
    ) -> Result<Self> {
        let local = options
            .local
            .unwrap_or_else(|| Arc::new(TracingSender::new("local")));

        let writer = BucketWriter::new(
            store,
            encoder,
            WriterOptions {
                key: options.key.clone(),
                encoding: JSON.to_string(),
                config: options.config,
                local: Some(local.clone()),
            },
        )?;

        Ok(Self {
            name: options.key,
            threshold: options.threshold,
            writer,
            local,
        })
    }

    pub fn writer(&self) -> &BucketWriter {
        &self.writer
    }
}

#[async_trait]
impl Sender for BucketSender {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, message: Message) {
        if message.priority < self.threshold {
            return;
        }

        let line = LogLine::new(message.priority, message.payload);
        if let Err(err) = self.writer.append_line(line).await {
            self.local
                .send(Message::new(
                    Priority::Error,
                    format!("sending to bucket '{}' failed: {}", self.name, err),
                ))
                .await;
        }
    }

    async fn flush(&self) -> std::result::Result<(), SinkError> {
        self.writer.flush().await.map_err(Into::into)
    }

    async fn close(&self) -> std::result::Result<(), SinkError> {
        self.writer.close().await.map_err(Into::into)
    }
}

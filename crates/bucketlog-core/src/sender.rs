//! The leveled-sink capability.
//!
//! [`Sender`] is the seam between this system and a generic leveled-logging
//! framework: anything that can accept a composed [`Message`], flush, and
//! close. The storage engine implements it (`BucketSender` in
//! `bucketlog-storage`); [`TracingSender`] is the local fallback used when
//! chunk persistence fails, so no record disappears from observability even
//! when it is lost from durable storage.

use async_trait::async_trait;

use crate::line::Message;
use crate::priority::Priority;

/// Errors surfaced by sink flush/close.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// A leveled message sink.
#[async_trait]
pub trait Sender: Send + Sync {
    fn name(&self) -> &str;

    /// Accept a composed message. Send never fails: implementations route
    /// internal errors to their own fallback rather than surfacing them.
    async fn send(&self, message: Message);

    async fn flush(&self) -> Result<(), SinkError>;

    async fn close(&self) -> Result<(), SinkError>;
}

/// Fallback sender that renders messages through `tracing`.
pub struct TracingSender {
    name: String,
}

impl TracingSender {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Sender for TracingSender {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, message: Message) {
        let rendered = message.rendered();
        match message.priority {
            Priority::Trace => tracing::trace!(sender = %self.name, "{}", rendered),
            Priority::Debug => tracing::debug!(sender = %self.name, "{}", rendered),
            Priority::Info => tracing::info!(sender = %self.name, "{}", rendered),
            Priority::Warning => tracing::warn!(sender = %self.name, "{}", rendered),
            Priority::Error => tracing::error!(sender = %self.name, "{}", rendered),
        }
    }

    async fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

//! Encoding bridge.
//!
//! [`Encoder`] glues the codec registry to the chunk-key scheme: resolve a
//! codec by name (empty name means plain text), marshal a value, and mint a
//! chunk key carrying the codec's file extension. The registry is an
//! explicit value owned by the encoder, injected at construction.

use std::sync::Arc;

use serde_json::Value;

use bucketlog_core::key;
use bucketlog_encoding::{Codec, CodecRegistry, EncodingError, PLAIN_TEXT};

use crate::error::{Error, Result};

#[derive(Clone)]
pub struct Encoder {
    registry: Arc<CodecRegistry>,
}

impl Encoder {
    pub fn new(registry: Arc<CodecRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    /// Resolve a codec by name. An empty name resolves to plain text.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Codec>> {
        let name = if name.is_empty() { PLAIN_TEXT } else { name };
        self.registry
            .get(name)
            .ok_or_else(|| EncodingError::UnknownEncoding(name.to_string()).into())
    }

    /// Marshal `value` and derive a fresh chunk key under `key_prefix`.
    ///
    /// Rejects an empty prefix before resolving or marshaling anything.
    pub fn encode(&self, value: &Value, key_prefix: &str, encoding: &str) -> Result<(String, Vec<u8>)> {
        if key_prefix.is_empty() {
            return Err(Error::invalid("key prefix must not be empty"));
        }
        let codec = self.resolve(encoding)?;
        let data = codec.marshal(value)?;
        Ok((key::chunk_key(key_prefix, codec.extension()), data))
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(Arc::new(CodecRegistry::default()))
    }
}

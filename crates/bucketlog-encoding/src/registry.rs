//! Codec registry and the built-in codecs.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::codec::Codec;
use crate::error::{EncodingError, Result};

/// Name of the built-in plain-text codec.
pub const PLAIN_TEXT: &str = "plain_text";

/// Name of the built-in JSON codec.
pub const JSON: &str = "json";

/// An explicit, instance-owned codec lookup table.
///
/// `CodecRegistry::default()` carries the built-ins; `CodecRegistry::empty()`
/// starts bare for callers that want full control over the codec set.
pub struct CodecRegistry {
    codecs: HashMap<&'static str, Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// A registry with no codecs.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// A registry carrying the built-in `plain_text` and `json` codecs.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(PlainTextCodec));
        registry.register(Arc::new(JsonCodec));
        registry
    }

    /// Register a codec under its declared name.
    ///
    /// A name that is already registered is left untouched.
    pub fn register(&mut self, codec: Arc<dyn Codec>) {
        self.codecs.entry(codec.name()).or_insert(codec);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Codec>> {
        self.codecs.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.codecs.keys().copied()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Identity byte copy for string values.
#[derive(Debug)]
struct PlainTextCodec;

impl Codec for PlainTextCodec {
    fn name(&self) -> &'static str {
        PLAIN_TEXT
    }

    fn extension(&self) -> &'static str {
        "txt"
    }

    fn marshal(&self, value: &Value) -> Result<Vec<u8>> {
        match value {
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            other => Err(EncodingError::Marshal {
                codec: PLAIN_TEXT.to_string(),
                reason: format!("plain text only marshals string values, got {}", kind(other)),
            }),
        }
    }

    fn unmarshal(&self, data: &[u8]) -> Result<Value> {
        Ok(Value::String(String::from_utf8_lossy(data).into_owned()))
    }
}

/// serde_json marshal/unmarshal.
#[derive(Debug)]
struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        JSON
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn marshal(&self, value: &Value) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| EncodingError::Marshal {
            codec: JSON.to_string(),
            reason: e.to_string(),
        })
    }

    fn unmarshal(&self, data: &[u8]) -> Result<Value> {
        serde_json::from_slice(data).map_err(|e| EncodingError::Unmarshal {
            codec: JSON.to_string(),
            reason: e.to_string(),
        })
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

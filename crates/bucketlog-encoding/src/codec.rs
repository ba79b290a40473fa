//! The codec capability and typed bridge helpers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{EncodingError, Result};

/// A named encode/decode pair plus a declared file extension.
///
/// Codecs operate on `serde_json::Value` to stay object-safe; use
/// [`marshal_value`] / [`unmarshal_value`] to work with concrete types.
pub trait Codec: Send + Sync + std::fmt::Debug {
    /// Registry name, e.g. `plain_text`.
    fn name(&self) -> &'static str;

    /// File extension appended to chunk keys, without the dot.
    fn extension(&self) -> &'static str;

    fn marshal(&self, value: &Value) -> Result<Vec<u8>>;

    fn unmarshal(&self, data: &[u8]) -> Result<Value>;
}

/// Marshal a concrete serde value through a codec.
pub fn marshal_value<T>(codec: &dyn Codec, value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(value).map_err(|e| EncodingError::Marshal {
        codec: codec.name().to_string(),
        reason: e.to_string(),
    })?;
    codec.marshal(&value)
}

/// Unmarshal codec output into a concrete serde target.
///
/// Fails with [`EncodingError::UnsupportedTarget`] when the decoded value
/// does not fit `T` - for the plain-text codec that means any non-string
/// target.
pub fn unmarshal_value<T>(codec: &dyn Codec, data: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let value = codec.unmarshal(data)?;
    serde_json::from_value(value).map_err(|_| EncodingError::UnsupportedTarget {
        codec: codec.name().to_string(),
        target: std::any::type_name::<T>(),
    })
}

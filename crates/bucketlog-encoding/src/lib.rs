//! Pluggable payload encodings.
//!
//! A [`Codec`] is a named marshal/unmarshal pair plus a declared file
//! extension, looked up by name from a [`CodecRegistry`]. The registry is an
//! explicit value owned by whoever needs codec resolution - there is no
//! global registry, so two stores can carry different codec sets without
//! coupling.
//!
//! Two codecs are built in:
//!
//! - `plain_text` (extension `txt`): marshal is an identity byte copy for
//!   string values only; unmarshal only supports a string target.
//! - `json` (extension `json`): serde_json marshal/unmarshal.
//!
//! Codecs operate on `serde_json::Value` so the registry stays object-safe;
//! [`marshal_value`] / [`unmarshal_value`] bridge to concrete serde types.

pub mod codec;
pub mod error;
pub mod registry;

pub use codec::{marshal_value, unmarshal_value, Codec};
pub use error::{EncodingError, Result};
pub use registry::{CodecRegistry, JSON, PLAIN_TEXT};

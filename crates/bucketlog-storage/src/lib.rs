//! bucketlog storage engine.
//!
//! Buffers application records in memory and periodically persists them as
//! discrete, time-ordered chunks to a blob store, later reconstructing the
//! original ordered stream on read.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │  Producers    │    │   Sender     │    │  File tail   │
//! │  append()     │    │   send()     │    │  follow()    │
//! └──────┬───────┘    └──────┬───────┘    └──────┬───────┘
//!        │ values/bytes      │ log lines         │ raw lines
//!        ▼                   ▼                   │
//! ┌─────────────────────────────────┐           │
//! │ BucketWriter                    │           │
//! │ - in-memory buffer              │           │
//! │ - size / timer / close flush    │           │
//! └───────────────┬─────────────────┘           │
//!                 │ one chunk per flush         │
//!                 ▼                             ▼
//! ┌─────────────────────────────────────────────────────┐
//! │ object store  (S3 / local filesystem / in-memory)   │
//! │ keys: [prefix/]<sortable-token>[.ext]               │
//! └───────────────┬─────────────────────────────────────┘
//!                 │ list + sort + sequential get
//!                 ▼
//! ┌─────────────────────────────────┐
//! │ ChunkReader                     │
//! │ - one continuous byte stream    │
//! │ - or chunk-at-a-time pages      │
//! └─────────────────────────────────┘
//! ```
//!
//! ## Main components
//!
//! - [`ChunkStore`] - top-level handle: one-shot writes, metadata, and
//!   constructors for the stateful collaborators.
//! - [`BucketWriter`] - the buffered write path (size, timer, and close
//!   flush triggers; exactly one chunk per flush).
//! - [`ChunkReader`] - the read path (chronological or reversed).
//! - [`BucketSender`] - the leveled-sink integration.
//! - [`open_bucket`] - validated bucket construction over `object_store`.
//!
//! Ordering is carried entirely by the key scheme
//! (`bucketlog_core::key`): a flush mints a fresh, strictly monotonic,
//! zero-padded timestamp token, so a lexicographic sort of the listed keys
//! recovers chronological order with no index or metadata database.

pub mod bucket;
pub mod config;
pub mod encode;
pub mod error;
pub mod reader;
pub mod sender;
pub mod store;
pub mod tail;
pub mod writer;

pub use bucket::{open_bucket, BucketConfig, BucketProvider, DEFAULT_S3_REGION};
pub use config::{TailConfig, WriterConfig};
pub use encode::Encoder;
pub use error::{Error, Result};
pub use reader::ChunkReader;
pub use sender::{BucketSender, SenderOptions};
pub use store::{
    AddMetadataOptions, ChunkStore, FollowOptions, ReadOptions, WriteBytesOptions, WriteOptions,
    METADATA_NAME,
};
pub use writer::{BucketWriter, WriterOptions};

//! Core data model for bucketlog.
//!
//! This crate holds the leaf types shared by the storage engine and anything
//! that integrates with it:
//!
//! - [`Priority`] - leveled priorities used for sender thresholding
//! - [`LogLine`] - one structured, timestamped log record
//! - [`Message`] - a composed unit accepted by a [`Sender`]
//! - [`key`] - the chunk-key scheme (sortable keys, chronological recovery)
//! - [`Sender`] - the leveled-sink capability the storage engine implements,
//!   plus [`TracingSender`], the local fallback that renders through `tracing`
//!
//! Nothing here performs I/O; the storage engine lives in
//! `bucketlog-storage`.

pub mod key;
pub mod line;
pub mod priority;
pub mod sender;

pub use line::{LogLine, Message};
pub use priority::Priority;
pub use sender::{Sender, SinkError, TracingSender};

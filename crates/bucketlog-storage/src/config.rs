//! Writer and tail configuration.
//!
//! Plain serde-derived structs with field-level defaults, so partial
//! configs deserialize cleanly and `Default` matches the documented
//! defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Flush policy for a buffered writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Maximum buffered byte size before an eager flush (default: 10 MB).
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,

    /// Interval for time-based flushes, regardless of buffer size
    /// (default: 1 minute). Zero disables periodic flushing.
    #[serde(default = "default_flush_interval")]
    pub flush_interval: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_buffer_size: default_max_buffer_size(),
            flush_interval: default_flush_interval(),
        }
    }
}

/// Buffering policy for the file-tail adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailConfig {
    /// Accumulated line bytes before forwarding one raw chunk
    /// (default: 10 MB).
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,

    /// How often to poll the file for appended data once caught up
    /// (default: 250 ms).
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            max_buffer_size: default_max_buffer_size(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_max_buffer_size() -> usize {
    10_000_000 // 10 MB
}

fn default_flush_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(250)
}

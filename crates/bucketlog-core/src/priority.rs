//! Leveled priorities.
//!
//! Variant order doubles as severity order, so threshold checks are plain
//! comparisons: `message.priority >= threshold`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a log line or composed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
}

impl Priority {
    /// Numeric value persisted alongside log lines.
    pub fn value(self) -> u8 {
        match self {
            Priority::Trace => 20,
            Priority::Debug => 30,
            Priority::Info => 40,
            Priority::Warning => 60,
            Priority::Error => 70,
        }
    }

    /// Human-readable label persisted alongside log lines.
    pub fn label(self) -> &'static str {
        match self {
            Priority::Trace => "trace",
            Priority::Debug => "debug",
            Priority::Info => "info",
            Priority::Warning => "warning",
            Priority::Error => "error",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Info
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

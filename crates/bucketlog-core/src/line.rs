//! Structured log lines and composed messages.
//!
//! [`LogLine`] is the persisted form: what a buffered writer actually
//! marshals into a chunk. [`Message`] is the transport form: what callers
//! hand to a [`Sender`](crate::sender::Sender), carrying a priority and an
//! arbitrary payload. A sender that accepts a message stamps it into a
//! `LogLine` at send time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::priority::Priority;

/// One structured log record.
///
/// Serialized field names match the persisted chunk format: the timestamp is
/// written as `ts`, and the label is omitted when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,

    /// Numeric priority, see [`Priority::value`].
    pub priority: u8,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub priority_label: String,

    /// Arbitrary payload.
    pub data: Value,
}

impl LogLine {
    /// Build a line stamped with the current time.
    pub fn new(priority: Priority, data: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            priority: priority.value(),
            priority_label: priority.label().to_string(),
            data,
        }
    }

    /// The payload as it renders inside a chunk, used for size accounting.
    pub fn rendered(&self) -> String {
        render_value(&self.data)
    }
}

/// A composed unit accepted by a [`Sender`](crate::sender::Sender).
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub priority: Priority,
    pub payload: Value,
}

impl Message {
    pub fn new(priority: Priority, payload: impl Into<Value>) -> Self {
        Self {
            priority,
            payload: payload.into(),
        }
    }

    /// The payload's rendered string form.
    ///
    /// String payloads render verbatim; everything else renders as compact
    /// JSON. This is the representation used for buffer size accounting.
    pub fn rendered(&self) -> String {
        render_value(&self.payload)
    }
}

/// Render a payload value the way it is transmitted.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn line_serializes_with_persisted_field_names() {
        let line = LogLine::new(Priority::Warning, json!({"msg": "disk low"}));
        let value = serde_json::to_value(&line).unwrap();

        assert!(value.get("ts").is_some());
        assert_eq!(value["priority"], 60);
        assert_eq!(value["priority_label"], "warning");
        assert_eq!(value["data"]["msg"], "disk low");
    }

    #[test]
    fn empty_label_is_omitted() {
        let mut line = LogLine::new(Priority::Info, json!("hello"));
        line.priority_label = String::new();
        let value = serde_json::to_value(&line).unwrap();
        assert!(value.get("priority_label").is_none());
    }

    #[test]
    fn string_payloads_render_verbatim() {
        let msg = Message::new(Priority::Info, "plain text");
        assert_eq!(msg.rendered(), "plain text");

        let msg = Message::new(Priority::Info, json!({"n": 1}));
        assert_eq!(msg.rendered(), r#"{"n":1}"#);
    }
}

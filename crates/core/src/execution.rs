//! Execution records — units of pending work surfaced by the server.
//!
//! The client never owns an execution: it is fetched read-only and
//! terminated by exactly one action submission. Extraction from the
//! raw API value is defensive throughout — missing or mistyped fields
//! degrade to documented defaults, never errors.

use serde_json::{Map, Value};

/// One unit of pending work reported by the executions API.
#[derive(Debug, Clone, Default)]
pub struct Execution {
    /// Unique execution identifier. Empty when absent from the record.
    pub uid: String,
    /// Event identifier, e.g. `"result.submitted"`. Empty when absent.
    pub event_type: String,
    /// Free-form event payload. Empty when absent or not an object.
    pub event_payload: Map<String, Value>,
}

impl Execution {
    /// Extract an execution from a raw API value.
    ///
    /// Returns `None` only when the value is not a JSON object at all;
    /// missing or mistyped fields inside an object default instead.
    pub fn from_value(value: &Value) -> Option<Self> {
        let record = value.as_object()?;
        Some(Self {
            uid: record
                .get("uid")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            event_type: record
                .get("event_type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            event_payload: record
                .get("event_payload")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        })
    }
}

/// Parse a fetch-executions response body.
///
/// The server returns either a bare array of execution records or an
/// envelope exposing them under `results`; any other shape is an empty
/// batch.
pub fn parse_execution_batch(body: &Value) -> Vec<Execution> {
    let items: &[Value] = match body {
        Value::Array(items) => items.as_slice(),
        Value::Object(envelope) => match envelope.get("results") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };
    items.iter().filter_map(Execution::from_value).collect()
}

//! Per-element classification of notification messages.
//!
//! A feed element is either a human-readable log line carrying an embedded
//! JSON payload after [`ORDER_RECEIVED_MARKER`], an already-structured JSON
//! object, or noise. Classification never fails; malformed payloads are
//! reported as [`FeedMessage::Malformed`] so callers can count them.

use serde_json::{Map, Value};

/// Prefix marker of an order-received log line.
pub const ORDER_RECEIVED_MARKER: &str = "Orden recibida:";

#[derive(Debug)]
pub enum FeedMessage<'a> {
    /// Marker found and the remainder decoded as JSON.
    Embedded(Value),
    /// Element is a JSON object in its own right.
    Structured(&'a Map<String, Value>),
    /// Marker found but the remainder is not valid JSON.
    Malformed(serde_json::Error),
    /// String without the marker, or any other JSON value.
    Unrecognized,
}

pub fn classify_message(msg: &Value) -> FeedMessage<'_> {
    match msg {
        Value::String(s) => match extract_payload(s) {
            Some(payload) => match serde_json::from_str::<Value>(payload) {
                Ok(v) => FeedMessage::Embedded(v),
                Err(e) => FeedMessage::Malformed(e),
            },
            None => FeedMessage::Unrecognized,
        },
        Value::Object(map) => FeedMessage::Structured(map),
        _ => FeedMessage::Unrecognized,
    }
}

/// Text after the marker with leading whitespace removed.
fn extract_payload(line: &str) -> Option<&str> {
    line.split_once(ORDER_RECEIVED_MARKER)
        .map(|(_, rest)| rest.trim_start())
}

//! Notification feed parsing.
//!
//! Best-effort per element: one malformed message never aborts the batch.
//! The only hard failure is a response without a `messages` array.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::FeedError;
use crate::message::{classify_message, FeedMessage};
use crate::order::Order;

/// Per-batch counters, surfaced for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedParseStats {
    /// Elements in `messages`.
    pub total: usize,
    /// Orders kept.
    pub parsed: usize,
    /// Marker present but payload undecodable or unmaterializable.
    pub soft_failures: usize,
    /// Decoded orders dropped for `id == 0` / missing id.
    pub sentinels_dropped: usize,
    /// Elements without the marker or of another shape.
    pub unrecognized: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedBatch {
    pub orders: Vec<Order>,
    pub stats: FeedParseStats,
}

/// Extract canonical orders from a notification feed response.
pub fn parse_feed(response: &Value) -> Result<FeedBatch, FeedError> {
    let messages = response
        .get("messages")
        .and_then(Value::as_array)
        .ok_or(FeedError::UnexpectedFormat {
            expected: "a `messages` array",
        })?;

    let mut stats = FeedParseStats {
        total: messages.len(),
        ..FeedParseStats::default()
    };
    let mut orders = Vec::with_capacity(messages.len());

    for (idx, msg) in messages.iter().enumerate() {
        let payload = match classify_message(msg) {
            FeedMessage::Embedded(v) => v,
            FeedMessage::Malformed(e) => {
                warn!(index = idx, error = %e, "feed message payload is not valid JSON; dropped");
                stats.soft_failures += 1;
                continue;
            }
            FeedMessage::Structured(_) | FeedMessage::Unrecognized => {
                stats.unrecognized += 1;
                continue;
            }
        };

        match Order::from_value(&payload) {
            Ok(order) if order.is_sentinel() => stats.sentinels_dropped += 1,
            Ok(order) => orders.push(order),
            Err(e) => {
                warn!(index = idx, error = %e, "feed message payload is not an order; dropped");
                stats.soft_failures += 1;
            }
        }
    }

    stats.parsed = orders.len();
    debug!(
        total = stats.total,
        parsed = stats.parsed,
        soft_failures = stats.soft_failures,
        sentinels = stats.sentinels_dropped,
        unrecognized = stats.unrecognized,
        "parsed notification feed"
    );

    Ok(FeedBatch { orders, stats })
}

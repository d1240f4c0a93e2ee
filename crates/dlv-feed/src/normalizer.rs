//! Order-listing normalization.
//!
//! The order service answers `GET /v1/order/client/{id}` either with a
//! materialized list (`{ data: [...] }`) or with a feed-style batch
//! (`{ messages: [...] }`), depending on backend version. Both collapse to
//! `Vec<Order>` here. Unlike the feed parser, `id == 0` records are kept.
//!
//! Pure functions: same input, structurally equal output.

use serde_json::Value;
use tracing::warn;

use crate::message::{classify_message, FeedMessage};
use crate::order::Order;

/// Normalize a client-order listing response.
///
/// `data` wins over `messages` when both are present. Any other shape yields
/// an empty list: absence of a listing is not a failure.
pub fn normalize_client_orders(response: &Value) -> Vec<Order> {
    if let Some(data) = data_array(response) {
        return materialize_data(data);
    }

    match response.get("messages").and_then(Value::as_array) {
        Some(messages) => messages
            .iter()
            .enumerate()
            .filter_map(|(idx, msg)| message_to_order(idx, msg))
            .collect(),
        None => Vec::new(),
    }
}

/// Normalize the all-orders listing (`GET /v1/order`): `{ data: [...] }` or nothing.
pub fn normalize_order_list(response: &Value) -> Vec<Order> {
    data_array(response).map(materialize_data).unwrap_or_default()
}

fn data_array(response: &Value) -> Option<&[Value]> {
    response
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}

fn materialize_data(data: &[Value]) -> Vec<Order> {
    data.iter()
        .enumerate()
        .filter_map(|(idx, v)| match Order::from_value(v) {
            Ok(order) => Some(order),
            Err(e) => {
                warn!(index = idx, error = %e, "order listing entry dropped");
                None
            }
        })
        .collect()
}

fn message_to_order(idx: usize, msg: &Value) -> Option<Order> {
    let materialized = match classify_message(msg) {
        FeedMessage::Embedded(v) => Order::from_value(&v),
        FeedMessage::Structured(_) => Order::from_value(msg),
        FeedMessage::Malformed(e) => {
            warn!(index = idx, error = %e, "order message payload is not valid JSON; dropped");
            return None;
        }
        FeedMessage::Unrecognized => return None,
    };

    match materialized {
        Ok(order) => Some(order),
        Err(e) => {
            warn!(index = idx, error = %e, "order message is not an order; dropped");
            None
        }
    }
}

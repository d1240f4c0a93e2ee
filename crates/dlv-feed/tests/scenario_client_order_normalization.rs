//! Client-order normalization scenarios.
//!
//! GREEN when:
//! - `{ data: [...] }` comes back verbatim, casing preserved
//! - `{ messages: [...] }` with one valid and one malformed entry gives one record
//! - the `id == 0` sentinel is kept here, unlike feed parsing
//! - normalizing twice gives structurally equal output

use dlv_feed::{normalize_client_orders, parse_feed};
use serde_json::json;

#[test]
fn data_shape_is_returned_verbatim() {
    let response = json!({
        "data": [
            { "id": 2, "client_id": 1, "total_price": 1499.99, "status": "Pending", "product_id": 1, "quantity": 1 },
            { "id": 3, "client_id": 1, "total_price": 149.99, "status": "pending", "product_id": 10, "quantity": 1 }
        ]
    });

    let orders = normalize_client_orders(&response);

    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].status().as_str(), "Pending");
    assert_eq!(orders[1].status().as_str(), "pending");
    assert_eq!(
        serde_json::to_value(&orders).unwrap(),
        response["data"],
        "round-trips to the upstream representation"
    );
}

#[test]
fn messages_shape_drops_only_the_malformed_entry() {
    let response = json!({
        "messages": [
            "Orden recibida: {\"id\":7,\"client_id\":3,\"total_price\":20,\"status\":\"processing\",\"product_id\":4,\"quantity\":1}",
            "Orden recibida: {this is not json"
        ]
    });

    let orders = normalize_client_orders(&response);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id(), 7);
}

#[test]
fn sentinel_is_kept_by_normalizer_but_dropped_by_feed_parser() {
    let response = json!({
        "messages": ["Orden recibida: {\"id\":0,\"status\":\"pending\"}"]
    });

    let normalized = normalize_client_orders(&response);
    assert_eq!(normalized.len(), 1);
    assert_eq!(normalized[0].id(), 0);

    let parsed = parse_feed(&response).unwrap();
    assert!(parsed.orders.is_empty());
}

#[test]
fn normalization_is_idempotent() {
    let response = json!({
        "messages": [
            "Orden recibida: {\"id\":1,\"status\":\"pending\"}",
            { "id": 2, "status": "delivered" },
            "noise"
        ]
    });

    let a = normalize_client_orders(&response);
    let b = normalize_client_orders(&response);
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
}

#[test]
fn float_artifact_total_survives_both_listing_shapes() {
    let data = json!({
        "data": [{ "id": 5, "client_id": 1, "total_price": 0.30000000000000004, "status": "pending" }]
    });
    let orders = normalize_client_orders(&data);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].total_price_micros(), 300_000);

    let messages = json!({
        "messages": [
            "Orden recibida: {\"id\":5,\"client_id\":1,\"total_price\":0.30000000000000004,\"status\":\"pending\"}"
        ]
    });
    let orders = normalize_client_orders(&messages);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id(), 5);
    assert_eq!(orders[0].total_price_micros(), 300_000);
}

//! Repositories over the real reqwest transport, against an in-process mock
//! server. No external network.

use std::sync::Arc;
use std::time::Duration;

use dlv_feed::{
    FeedError, FeedNotificationRepository, HttpTransport, NewOrder, NotificationRepository,
    OrderRepository, ServiceOrderRepository, StatusLabel, TransportError,
};
use httpmock::prelude::*;
use serde_json::json;

fn transport() -> Arc<HttpTransport> {
    Arc::new(HttpTransport::new(Duration::from_secs(5)).unwrap())
}

#[tokio::test]
async fn notifications_are_fetched_and_parsed() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/notifications");
            then.status(200).json_body(json!({
                "messages": [
                    "Orden recibida: {\"id\":3,\"client_id\":1,\"total_price\":149.99,\"status\":\"pending\",\"product_id\":10,\"quantity\":1}",
                    "Orden recibida: {\"id\":0}"
                ]
            }));
        })
        .await;

    let repo = FeedNotificationRepository::new(transport(), server.base_url());
    let orders = repo.get_notifications().await.unwrap();

    mock.assert_async().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id(), 3);
}

#[tokio::test]
async fn notifications_without_messages_is_format_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/notifications");
            then.status(200).json_body(json!({ "status": "ok" }));
        })
        .await;

    let repo = FeedNotificationRepository::new(transport(), server.base_url());
    let err = repo.get_notifications().await.unwrap_err();
    assert!(matches!(err, FeedError::UnexpectedFormat { .. }));
}

#[tokio::test]
async fn non_2xx_is_transport_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/notifications");
            then.status(503);
        })
        .await;

    let repo = FeedNotificationRepository::new(transport(), server.base_url());
    let err = repo.get_notifications().await.unwrap_err();
    assert!(matches!(
        err,
        FeedError::Transport(TransportError::Status { code: 503, .. })
    ));
}

#[tokio::test]
async fn status_update_is_acknowledged_locally() {
    let repo = FeedNotificationRepository::new(transport(), "http://127.0.0.1:9");
    let ack = repo
        .update_order_status(3, &StatusLabel::new("delivered"))
        .await
        .unwrap();
    assert!(ack.success);
    assert_eq!(ack.message, "order 3 updated to delivered");
}

#[tokio::test]
async fn client_orders_accept_both_shapes() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/order/client/1");
            then.status(200).json_body(json!({
                "data": [{ "id": 2, "client_id": 1, "status": "Pending" }]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/order/client/5");
            then.status(200).json_body(json!({
                "messages": ["Orden recibida: {\"id\":16,\"client_id\":5,\"status\":\"pending\"}"]
            }));
        })
        .await;

    let repo = ServiceOrderRepository::new(transport(), server.base_url());

    let one = repo.get_orders_by_client_id(1).await.unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].status().as_str(), "Pending");

    let five = repo.get_orders_by_client_id(5).await.unwrap();
    assert_eq!(five.len(), 1);
    assert_eq!(five[0].id(), 16);
}

#[tokio::test]
async fn all_orders_without_data_is_empty() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/order");
            then.status(200).json_body(json!({}));
        })
        .await;

    let repo = ServiceOrderRepository::new(transport(), server.base_url());
    assert!(repo.get_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_order_posts_payload_and_reads_wrapped_response() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/order/")
                .json_body(json!({
                    "client_id": 1, "product_id": 10, "quantity": 1, "total_price": 149.99
                }));
            then.status(201).json_body(json!({
                "data": {
                    "id": 42, "client_id": 1, "product_id": 10,
                    "quantity": 1, "total_price": 149.99, "status": "pending"
                }
            }));
        })
        .await;

    let repo = ServiceOrderRepository::new(transport(), server.base_url());
    let created = repo
        .create_order(&NewOrder {
            client_id: 1,
            product_id: 10,
            quantity: 1,
            total_price: 149_990_000,
        })
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(created.id(), 42);
}

//! Repository capabilities and their transport-backed implementations.
//!
//! Repositories signal failure only by returning `Err`; they never build a
//! failure-shaped value. Every failing call is logged here and propagated
//! unchanged to the use-case layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::error::FeedError;
use crate::normalizer::{normalize_client_orders, normalize_order_list};
use crate::order::{price, Order, StatusLabel};
use crate::parser::parse_feed;
use crate::transport::Transport;

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// Confirmation returned by a status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateAck {
    pub success: bool,
    pub message: String,
}

/// Order placement payload sent to `POST {host}/v1/order/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub client_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    #[serde(with = "price")]
    pub total_price: i64,
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Orders announced by the notification feed.
    async fn get_notifications(&self) -> Result<Vec<Order>, FeedError>;

    async fn update_order_status(
        &self,
        order_id: i64,
        status: &StatusLabel,
    ) -> Result<StatusUpdateAck, FeedError>;
}

#[async_trait::async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, FeedError>;

    async fn get_orders(&self) -> Result<Vec<Order>, FeedError>;

    async fn get_orders_by_client_id(&self, client_id: i64) -> Result<Vec<Order>, FeedError>;
}

// ---------------------------------------------------------------------------
// Notification feed
// ---------------------------------------------------------------------------

/// Notification repository over `GET {host}/api/notifications`.
pub struct FeedNotificationRepository<T: ?Sized> {
    transport: Arc<T>,
    host: String,
}

impl<T: Transport + ?Sized> FeedNotificationRepository<T> {
    pub fn new(transport: Arc<T>, host: impl Into<String>) -> Self {
        Self {
            transport,
            host: host.into(),
        }
    }

    fn notifications_url(&self) -> String {
        format!("{}/api/notifications", self.host.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> NotificationRepository for FeedNotificationRepository<T> {
    async fn get_notifications(&self) -> Result<Vec<Order>, FeedError> {
        let url = self.notifications_url();
        let result = match self.transport.get(&url).await {
            Ok(body) => parse_feed(&body).map(|batch| batch.orders),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = &result {
            error!(url = %url, error = %e, "fetching notifications failed");
        }
        result
    }

    /// No upstream mutation endpoint exists for status changes yet; the
    /// change is acknowledged locally.
    async fn update_order_status(
        &self,
        order_id: i64,
        status: &StatusLabel,
    ) -> Result<StatusUpdateAck, FeedError> {
        info!(order_id, status = %status, "updating order status");
        Ok(StatusUpdateAck {
            success: true,
            message: format!("order {order_id} updated to {status}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Order service
// ---------------------------------------------------------------------------

/// Order repository over the `{host}/v1/order` endpoints.
pub struct ServiceOrderRepository<T: ?Sized> {
    transport: Arc<T>,
    host: String,
}

impl<T: Transport + ?Sized> ServiceOrderRepository<T> {
    pub fn new(transport: Arc<T>, host: impl Into<String>) -> Self {
        Self {
            transport,
            host: host.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), path)
    }

    async fn get_json(&self, url: &str, what: &str) -> Result<Value, FeedError> {
        self.transport.get(url).await.map_err(|e| {
            error!(url = %url, error = %e, "{what} failed");
            FeedError::from(e)
        })
    }
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> OrderRepository for ServiceOrderRepository<T> {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, FeedError> {
        let url = self.url("/v1/order/");
        info!(
            client_id = order.client_id,
            product_id = order.product_id,
            quantity = order.quantity,
            "sending order"
        );

        let body = serde_json::to_value(order).map_err(|_| FeedError::UnexpectedFormat {
            expected: "a serializable order payload",
        })?;
        let created = self.transport.post(&url, &body).await.map_err(|e| {
            error!(url = %url, error = %e, "creating order failed");
            FeedError::from(e)
        })?;

        // Some backends wrap the created record in `data`.
        let record = match created.get("data") {
            Some(inner) if inner.is_object() => inner,
            _ => &created,
        };
        Order::from_value(record).map_err(|e| {
            error!(url = %url, error = %e, "created order response is not an order");
            FeedError::from(e)
        })
    }

    async fn get_orders(&self) -> Result<Vec<Order>, FeedError> {
        let body = self.get_json(&self.url("/v1/order"), "fetching orders").await?;
        Ok(normalize_order_list(&body))
    }

    async fn get_orders_by_client_id(&self, client_id: i64) -> Result<Vec<Order>, FeedError> {
        let url = self.url(&format!("/v1/order/client/{client_id}"));
        let body = self.get_json(&url, "fetching client orders").await?;
        Ok(normalize_client_orders(&body))
    }
}

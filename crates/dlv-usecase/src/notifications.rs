//! Notification-feed use cases.

use std::sync::Arc;

use dlv_feed::{NotificationRepository, Order, StatusLabel, StatusUpdateAck};

use crate::envelope::Envelope;
use crate::fail_from;

pub const ERR_ORDER_ID_REQUIRED: &str = "order id is required";
pub const ERR_STATUS_REQUIRED: &str = "status is required";

const DEFAULT_FETCH_FAILURE: &str = "failed to fetch notifications";
const DEFAULT_UPDATE_FAILURE: &str = "failed to update order status";

/// Orders announced by the notification feed.
pub struct GetNotifications {
    repo: Arc<dyn NotificationRepository>,
}

impl GetNotifications {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self) -> Envelope<Vec<Order>> {
        match self.repo.get_notifications().await {
            Ok(orders) => Envelope::ok(orders),
            Err(e) => fail_from("get_notifications", &e, DEFAULT_FETCH_FAILURE),
        }
    }
}

/// Status change for one order.
pub struct UpdateOrderStatus {
    repo: Arc<dyn NotificationRepository>,
}

impl UpdateOrderStatus {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }

    /// Input validation, run before any IO.
    pub fn validate(order_id: i64, status: &str) -> Result<StatusLabel, &'static str> {
        if order_id == 0 {
            return Err(ERR_ORDER_ID_REQUIRED);
        }
        let label = StatusLabel::new(status.trim());
        if label.is_empty() {
            return Err(ERR_STATUS_REQUIRED);
        }
        Ok(label)
    }

    pub async fn execute(&self, order_id: i64, status: &str) -> Envelope<StatusUpdateAck> {
        let label = match Self::validate(order_id, status) {
            Ok(label) => label,
            Err(msg) => {
                tracing::warn!(use_case = "update_order_status", order_id, error = msg, "rejected");
                return Envelope::fail(msg);
            }
        };

        match self.repo.update_order_status(order_id, &label).await {
            Ok(ack) => Envelope::ok(ack),
            Err(e) => fail_from("update_order_status", &e, DEFAULT_UPDATE_FAILURE),
        }
    }
}

//! Order-service use cases.

use std::sync::Arc;

use dlv_feed::{NewOrder, Order, OrderRepository};

use crate::envelope::Envelope;
use crate::fail_from;

pub const ERR_CLIENT_ID_REQUIRED: &str = "client id is required";
pub const ERR_PRODUCT_ID_REQUIRED: &str = "product id is required";
pub const ERR_QUANTITY_POSITIVE: &str = "quantity must be positive";

/// Orders placed by one client, whatever shape the service answers with.
pub struct GetClientOrders {
    repo: Arc<dyn OrderRepository>,
}

impl GetClientOrders {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, client_id: i64) -> Envelope<Vec<Order>> {
        if client_id == 0 {
            tracing::warn!(use_case = "get_client_orders", error = ERR_CLIENT_ID_REQUIRED, "rejected");
            return Envelope::fail(ERR_CLIENT_ID_REQUIRED);
        }
        match self.repo.get_orders_by_client_id(client_id).await {
            Ok(orders) => Envelope::ok(orders),
            Err(e) => fail_from("get_client_orders", &e, "failed to fetch client orders"),
        }
    }
}

pub struct GetOrders {
    repo: Arc<dyn OrderRepository>,
}

impl GetOrders {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self) -> Envelope<Vec<Order>> {
        match self.repo.get_orders().await {
            Ok(orders) => Envelope::ok(orders),
            Err(e) => fail_from("get_orders", &e, "failed to fetch orders"),
        }
    }
}

pub struct CreateOrder {
    repo: Arc<dyn OrderRepository>,
}

impl CreateOrder {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self { repo }
    }

    pub fn validate(order: &NewOrder) -> Result<(), &'static str> {
        if order.client_id == 0 {
            return Err(ERR_CLIENT_ID_REQUIRED);
        }
        if order.product_id == 0 {
            return Err(ERR_PRODUCT_ID_REQUIRED);
        }
        if order.quantity <= 0 {
            return Err(ERR_QUANTITY_POSITIVE);
        }
        Ok(())
    }

    pub async fn execute(&self, order: &NewOrder) -> Envelope<Order> {
        if let Err(msg) = Self::validate(order) {
            tracing::warn!(use_case = "create_order", error = msg, "rejected");
            return Envelope::fail(msg);
        }
        match self.repo.create_order(order).await {
            Ok(created) => Envelope::ok(created),
            Err(e) => fail_from("create_order", &e, "failed to create order"),
        }
    }
}

//! Order-service commands: `dlv orders [--client <id>]`.

use std::sync::Arc;

use anyhow::Result;
use dlv_config::DashboardConfig;
use dlv_feed::{OrderRepository, ServiceOrderRepository};
use dlv_usecase::{GetClientOrders, GetOrders};

use super::{emit, transport};

pub async fn list(cfg: &DashboardConfig, client: Option<i64>) -> Result<()> {
    let repo: Arc<dyn OrderRepository> =
        Arc::new(ServiceOrderRepository::new(transport(cfg)?, cfg.order_base()));

    match client {
        Some(client_id) => {
            let uc = GetClientOrders::new(repo);
            emit("orders", &uc.execute(client_id).await)
        }
        None => {
            let uc = GetOrders::new(repo);
            emit("orders", &uc.execute().await)
        }
    }
}

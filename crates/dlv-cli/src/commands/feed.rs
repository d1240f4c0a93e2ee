//! Notification-feed commands: `dlv notifications`, `dlv set-status`.

use std::sync::Arc;

use anyhow::Result;
use dlv_config::DashboardConfig;
use dlv_feed::{FeedNotificationRepository, NotificationRepository};
use dlv_usecase::{GetNotifications, UpdateOrderStatus};

use super::{emit, transport};

fn repository(cfg: &DashboardConfig) -> Result<Arc<dyn NotificationRepository>> {
    Ok(Arc::new(FeedNotificationRepository::new(
        transport(cfg)?,
        cfg.notification_host.clone(),
    )))
}

pub async fn notifications(cfg: &DashboardConfig) -> Result<()> {
    let uc = GetNotifications::new(repository(cfg)?);
    emit("notifications", &uc.execute().await)
}

pub async fn set_status(cfg: &DashboardConfig, order_id: i64, status: &str) -> Result<()> {
    let uc = UpdateOrderStatus::new(repository(cfg)?);
    emit("set-status", &uc.execute(order_id, status).await)
}

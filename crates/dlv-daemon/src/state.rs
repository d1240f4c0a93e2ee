//! Shared runtime state for dlv-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The held order set is
//! not stored here: it lives inside the poller task and is read through
//! [`PollerHandle`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dlv_config::DashboardConfig;
use dlv_feed::{
    FeedNotificationRepository, HttpTransport, NotificationRepository, OrderRepository,
    ServiceOrderRepository,
};
use dlv_usecase::{CreateOrder, GetClientOrders, GetNotifications, GetOrders, UpdateOrderStatus};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::poller::{HeldOrders, PollerDeps, PollerHandle};

// ---------------------------------------------------------------------------
// BusMsg (SSE event bus payload)
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    Success,
    Error,
}

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Orders(HeldOrders),
    /// Transient, non-blocking message for the dashboard.
    Notice {
        severity: NoticeSeverity,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Everything one dashboard session owns. Dropping it stops the poller.
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    pub poller: PollerHandle,
    pub client_orders: GetClientOrders,
    pub all_orders: GetOrders,
    pub create_order: CreateOrder,
}

impl AppState {
    /// Wire use cases over the given repositories and spawn the poller.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        orders: Arc<dyn OrderRepository>,
        poll_interval: Duration,
    ) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);

        let deps = PollerDeps {
            get_notifications: Arc::new(GetNotifications::new(Arc::clone(&notifications))),
            update_status: Arc::new(UpdateOrderStatus::new(notifications)),
        };
        let poller = PollerHandle::spawn(deps, poll_interval, bus.clone());

        Self {
            bus,
            build: BuildInfo {
                service: "dlv-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            poller,
            client_orders: GetClientOrders::new(Arc::clone(&orders)),
            all_orders: GetOrders::new(Arc::clone(&orders)),
            create_order: CreateOrder::new(orders),
        }
    }

    /// Production wiring: reqwest transport against the configured hosts.
    pub fn from_config(cfg: &DashboardConfig) -> anyhow::Result<Self> {
        let transport = Arc::new(
            HttpTransport::new(Duration::from_secs(cfg.request_timeout_secs))
                .context("http transport init failed")?,
        );
        let notifications: Arc<dyn NotificationRepository> = Arc::new(
            FeedNotificationRepository::new(Arc::clone(&transport), cfg.notification_host.clone()),
        );
        let orders: Arc<dyn OrderRepository> =
            Arc::new(ServiceOrderRepository::new(transport, cfg.order_base()));

        Ok(Self::new(
            notifications,
            orders,
            Duration::from_secs(cfg.poll_interval_secs),
        ))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}

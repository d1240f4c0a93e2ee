//! Scenario: polling loop reconciliation
//!
//! GREEN when:
//! - a local status change wins over a stale poll until the server confirms
//!   it or one interval elapses, after which the server value shows again
//! - a failed poll leaves the held orders untouched, surfaces an error, and
//!   the next poll still fires on the normal interval
//! - at most one fetch is ever in flight, even when a fetch outlasts a tick
//! - cancel is idempotent and nothing is published after it
//! - invalid status changes are rejected without touching held state
//!
//! All tests run on a paused tokio clock against a scripted in-memory feed.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dlv_daemon::poller::{HeldOrders, PollPhase, PollerDeps, PollerHandle};
use dlv_daemon::state::{BusMsg, NoticeSeverity};
use dlv_feed::{
    FeedError, NotificationRepository, Order, StatusLabel, StatusUpdateAck, TransportError,
};
use dlv_usecase::{
    GetNotifications, UpdateOrderStatus, ERR_ORDER_ID_REQUIRED, ERR_STATUS_REQUIRED,
};
use serde_json::json;
use tokio::sync::{broadcast, watch};

const INTERVAL: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ScriptedFeed {
    /// Consumed front to back; once empty, `steady` is served.
    script: Mutex<VecDeque<Result<Vec<Order>, FeedError>>>,
    steady: Vec<Order>,
    latency: Duration,
    fail_updates: bool,
    polls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFeed {
    fn steady(orders: Vec<Order>) -> Self {
        Self {
            steady: orders,
            ..Self::default()
        }
    }

    fn then(self, next: Result<Vec<Order>, FeedError>) -> Self {
        self.script.lock().unwrap().push_back(next);
        self
    }
}

#[async_trait::async_trait]
impl NotificationRepository for ScriptedFeed {
    async fn get_notifications(&self) -> Result<Vec<Order>, FeedError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        next.unwrap_or_else(|| Ok(self.steady.clone()))
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: &StatusLabel,
    ) -> Result<StatusUpdateAck, FeedError> {
        if self.fail_updates {
            return Err(FeedError::Transport(TransportError::Network(
                "update endpoint unreachable".to_string(),
            )));
        }
        Ok(StatusUpdateAck {
            success: true,
            message: format!("order {order_id} updated to {status}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn order(id: i64, status: &str) -> Order {
    Order::from_value(&json!({
        "id": id,
        "client_id": 1,
        "product_id": 10,
        "quantity": 1,
        "total_price": 149.99,
        "status": status,
    }))
    .expect("fixture order")
}

fn network_down() -> FeedError {
    FeedError::Transport(TransportError::Network("connection refused".to_string()))
}

fn spawn(feed: Arc<ScriptedFeed>) -> (PollerHandle, broadcast::Receiver<BusMsg>) {
    let repo: Arc<dyn NotificationRepository> = feed;
    let deps = PollerDeps {
        get_notifications: Arc::new(GetNotifications::new(Arc::clone(&repo))),
        update_status: Arc::new(UpdateOrderStatus::new(repo)),
    };
    let (bus, rx) = broadcast::channel(256);
    (PollerHandle::spawn(deps, INTERVAL, bus), rx)
}

async fn wait_for(
    rx: &mut watch::Receiver<HeldOrders>,
    pred: impl FnMut(&HeldOrders) -> bool,
) -> HeldOrders {
    rx.wait_for(pred).await.expect("poller dropped its view").clone()
}

fn status_of(held: &HeldOrders, id: i64) -> Option<String> {
    held.orders
        .iter()
        .find(|o| o.id() == id)
        .map(|o| o.status().as_str().to_string())
}

// ---------------------------------------------------------------------------
// 1. Local edit survives a stale poll, then expires after one interval
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn local_edit_wins_over_stale_poll_until_interval_elapses() {
    let feed = Arc::new(ScriptedFeed::steady(vec![order(3, "pending")]));
    let (poller, _bus) = spawn(Arc::clone(&feed));
    let mut view = poller.subscribe();

    wait_for(&mut view, |h| h.cycles >= 1).await;

    let ack = poller.request_status_change(3, "delivered").await;
    assert!(ack.is_success(), "local ack expected, got {:?}", ack.error());
    let held = poller.snapshot();
    assert_eq!(status_of(&held, 3).as_deref(), Some("delivered"));
    assert!(held.pending_edits.get(3).is_some());

    // A poll right away still reports "pending": the overlay wins.
    poller.refresh();
    let held = wait_for(&mut view, |h| h.cycles >= 2).await;
    assert_eq!(status_of(&held, 3).as_deref(), Some("delivered"));
    assert_eq!(held.pending_edits.len(), 1);

    // The scheduled poll one interval later drops the overlay.
    let held = wait_for(&mut view, |h| h.cycles >= 3).await;
    assert_eq!(status_of(&held, 3).as_deref(), Some("pending"));
    assert!(held.pending_edits.is_empty());
}

// ---------------------------------------------------------------------------
// 2. Server confirmation clears the edit early
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn server_confirmation_clears_pending_edit() {
    let feed = Arc::new(
        ScriptedFeed::steady(vec![order(3, "delivered")]).then(Ok(vec![order(3, "pending")])),
    );
    let (poller, _bus) = spawn(Arc::clone(&feed));
    let mut view = poller.subscribe();

    wait_for(&mut view, |h| h.cycles >= 1).await;
    poller.request_status_change(3, "Delivered").await;

    poller.refresh();
    let held = wait_for(&mut view, |h| h.cycles >= 2).await;
    assert_eq!(status_of(&held, 3).as_deref(), Some("delivered"));
    assert!(held.pending_edits.is_empty(), "confirmed edit must be cleared");
}

// ---------------------------------------------------------------------------
// 3. Failed poll keeps held orders and the cadence
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn failed_poll_keeps_orders_and_next_poll_is_on_schedule() {
    let start = tokio::time::Instant::now();
    let feed = Arc::new(
        ScriptedFeed::steady(vec![order(3, "pending"), order(4, "processing")])
            .then(Ok(vec![order(3, "pending")]))
            .then(Err(network_down())),
    );
    let (poller, mut bus) = spawn(Arc::clone(&feed));
    let mut view = poller.subscribe();

    let before = wait_for(&mut view, |h| h.cycles >= 1).await;

    poller.refresh();
    let failed = wait_for(&mut view, |h| h.failures >= 1).await;
    assert_eq!(failed.phase, PollPhase::Error);
    assert_eq!(failed.orders, before.orders, "held orders must not change on failure");
    let err = failed.last_error.as_deref().unwrap_or_default();
    assert!(err.contains("connection refused"), "unexpected error: {err}");

    let mut saw_error_notice = false;
    while let Ok(msg) = bus.try_recv() {
        if let BusMsg::Notice {
            severity: NoticeSeverity::Error,
            ..
        } = msg
        {
            saw_error_notice = true;
        }
    }
    assert!(saw_error_notice, "poll failure must be surfaced as a notice");

    let recovered = wait_for(&mut view, |h| h.cycles >= 2).await;
    assert!(start.elapsed() >= INTERVAL, "next poll fired early");
    assert_eq!(recovered.phase, PollPhase::Idle);
    assert!(recovered.last_error.is_none());
    assert_eq!(recovered.orders.len(), 2);
    assert_eq!(feed.polls.load(Ordering::SeqCst), 3);
}

// ---------------------------------------------------------------------------
// 4. At most one fetch in flight
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn slow_fetch_never_overlaps_with_the_next_tick() {
    let feed = Arc::new(ScriptedFeed {
        steady: vec![order(3, "pending")],
        latency: Duration::from_secs(45),
        ..ScriptedFeed::default()
    });
    let (poller, _bus) = spawn(Arc::clone(&feed));
    let mut view = poller.subscribe();

    // Refresh while the first fetch is still running is ignored.
    tokio::time::sleep(Duration::from_secs(1)).await;
    poller.refresh();

    wait_for(&mut view, |h| h.cycles >= 2).await;
    assert_eq!(feed.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(feed.polls.load(Ordering::SeqCst), 2);
}

// ---------------------------------------------------------------------------
// 5. Cancel
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cancel_is_idempotent_and_stops_polling() {
    let feed = Arc::new(ScriptedFeed::steady(vec![order(3, "pending")]));
    let (poller, _bus) = spawn(Arc::clone(&feed));
    let mut view = poller.subscribe();

    wait_for(&mut view, |h| h.cycles >= 1).await;
    poller.cancel();
    poller.cancel();

    tokio::time::sleep(INTERVAL * 4).await;
    assert!(poller.is_finished());
    assert_eq!(feed.polls.load(Ordering::SeqCst), 1);

    let refused = poller.request_status_change(3, "delivered").await;
    assert!(!refused.is_success());
    assert_eq!(poller.snapshot().cycles, 1);

    poller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn cancel_mid_fetch_publishes_nothing_more() {
    let feed = Arc::new(ScriptedFeed {
        steady: vec![order(3, "pending")],
        latency: Duration::from_secs(10),
        ..ScriptedFeed::default()
    });
    let (poller, _bus) = spawn(Arc::clone(&feed));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(poller.snapshot().phase, PollPhase::Polling);
    poller.cancel();

    tokio::time::sleep(Duration::from_secs(60)).await;
    let held = poller.snapshot();
    assert_eq!(held.cycles, 0);
    assert!(held.orders.is_empty());
}

// ---------------------------------------------------------------------------
// 6. Validation and failed confirmation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn invalid_status_change_leaves_held_state_untouched() {
    let feed = Arc::new(ScriptedFeed::steady(vec![order(3, "pending")]));
    let (poller, _bus) = spawn(Arc::clone(&feed));
    let mut view = poller.subscribe();
    wait_for(&mut view, |h| h.cycles >= 1).await;

    let no_id = poller.request_status_change(0, "delivered").await;
    assert_eq!(no_id.error(), Some(ERR_ORDER_ID_REQUIRED));

    let blank = poller.request_status_change(3, "   ").await;
    assert_eq!(blank.error(), Some(ERR_STATUS_REQUIRED));

    let held = poller.snapshot();
    assert!(held.pending_edits.is_empty());
    assert_eq!(status_of(&held, 3).as_deref(), Some("pending"));
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_status_change_is_reported_but_kept() {
    let feed = Arc::new(ScriptedFeed {
        steady: vec![order(3, "pending")],
        fail_updates: true,
        ..ScriptedFeed::default()
    });
    let (poller, mut bus) = spawn(Arc::clone(&feed));
    let mut view = poller.subscribe();
    wait_for(&mut view, |h| h.cycles >= 1).await;

    let result = poller.request_status_change(3, "cancelled").await;
    assert!(!result.is_success());

    let held = poller.snapshot();
    assert_eq!(status_of(&held, 3).as_deref(), Some("cancelled"));
    assert!(held.pending_edits.get(3).is_some());

    let mut notices = Vec::new();
    while let Ok(msg) = bus.try_recv() {
        if let BusMsg::Notice { severity, message } = msg {
            notices.push((severity, message));
        }
    }
    assert!(notices
        .iter()
        .any(|(s, m)| *s == NoticeSeverity::Error && m.contains("unreachable")));
}

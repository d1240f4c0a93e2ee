//! Polling & reconciliation loop.
//!
//! One tokio task owns the held order set and the pending edits. Nothing else
//! mutates them; callers go through [`PollerHandle`]. Inside the task:
//!
//! - a fetch is started on spawn and on every tick of the interval, unless
//!   one is already in flight (at most one fetch at a time)
//! - a finished fetch is reconciled against the pending edits *as they are
//!   when it finishes*; no pending-edit state is held across an await
//! - a failed fetch leaves the held set untouched; the next tick still fires
//! - status changes are applied to the held set immediately, recorded as
//!   pending, then sent to the use case concurrently with any fetch
//!
//! Cancellation drops every in-flight future, so nothing is published after
//! [`PollerHandle::cancel`] returns control to the loop.

use std::sync::Arc;
use std::time::Duration;

use dlv_feed::{Order, StatusUpdateAck};
use dlv_reconcile::{apply_local_edit, reconcile, PendingEdits};
use dlv_usecase::{Envelope, GetNotifications, UpdateOrderStatus};
use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::state::{BusMsg, NoticeSeverity};

const COMMAND_QUEUE: usize = 64;
const ERR_POLLER_STOPPED: &str = "order poller is not running";

// ---------------------------------------------------------------------------
// Held state
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    Idle,
    Polling,
    Error,
}

/// What presentation code sees: the latest reconciled order set.
#[derive(Clone, Debug, Serialize)]
pub struct HeldOrders {
    pub phase: PollPhase,
    pub orders: Vec<Order>,
    /// Message of the most recent failed poll, cleared by the next success.
    pub last_error: Option<String>,
    pub pending_edits: PendingEdits,
    /// Successful reconciliation cycles so far.
    pub cycles: u64,
    /// Failed polls so far.
    pub failures: u64,
}

impl HeldOrders {
    fn initial() -> Self {
        Self {
            phase: PollPhase::Idle,
            orders: Vec::new(),
            last_error: None,
            pending_edits: PendingEdits::new(),
            cycles: 0,
            failures: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Use cases the loop drives.
#[derive(Clone)]
pub struct PollerDeps {
    pub get_notifications: Arc<GetNotifications>,
    pub update_status: Arc<UpdateOrderStatus>,
}

enum Command {
    StatusChange {
        order_id: i64,
        status: String,
        reply: oneshot::Sender<Envelope<StatusUpdateAck>>,
    },
    Refresh,
}

/// Owner-side handle. Dropping it cancels the loop.
pub struct PollerHandle {
    cmd_tx: mpsc::Sender<Command>,
    view_rx: watch::Receiver<HeldOrders>,
    shutdown_tx: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Spawn the loop on the current tokio runtime.
    ///
    /// Overlays expire after one `interval`.
    pub fn spawn(deps: PollerDeps, interval: Duration, bus: broadcast::Sender<BusMsg>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE);
        let (view_tx, view_rx) = watch::channel(HeldOrders::initial());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let actor = Actor {
            deps,
            held: HeldOrders::initial(),
            view_tx,
            bus,
            epoch: Instant::now(),
            max_overlay_age_ms: duration_ms(interval),
        };
        let join = tokio::spawn(run(actor, interval, cmd_rx, shutdown_rx));
        info!(interval_ms = duration_ms(interval), "order poller started");

        Self {
            cmd_tx,
            view_rx,
            shutdown_tx,
            join: Some(join),
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> HeldOrders {
        self.view_rx.borrow().clone()
    }

    /// Receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<HeldOrders> {
        self.view_rx.clone()
    }

    /// Optimistically set `order_id` to `status`, then confirm through the
    /// use case. A failed confirmation is reported but not rolled back.
    pub async fn request_status_change(
        &self,
        order_id: i64,
        status: &str,
    ) -> Envelope<StatusUpdateAck> {
        let (reply, rx) = oneshot::channel();
        let cmd = Command::StatusChange {
            order_id,
            status: status.to_string(),
            reply,
        };
        if self.cmd_tx.send(cmd).await.is_err() {
            return Envelope::fail(ERR_POLLER_STOPPED);
        }
        rx.await
            .unwrap_or_else(|_| Envelope::fail(ERR_POLLER_STOPPED))
    }

    /// Ask for an out-of-band poll. Ignored if one is already in flight.
    pub fn refresh(&self) {
        if self.cmd_tx.try_send(Command::Refresh).is_err() {
            debug!("refresh dropped; poller busy or stopped");
        }
    }

    /// Stop scheduling polls and drop in-flight work. Idempotent.
    pub fn cancel(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel and wait for the loop task to exit.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

type UpdateDone = (i64, Envelope<StatusUpdateAck>, oneshot::Sender<Envelope<StatusUpdateAck>>);

struct Actor {
    deps: PollerDeps,
    held: HeldOrders,
    view_tx: watch::Sender<HeldOrders>,
    bus: broadcast::Sender<BusMsg>,
    epoch: Instant,
    max_overlay_age_ms: i64,
}

async fn run(
    mut actor: Actor,
    interval: Duration,
    mut cmd_rx: mpsc::Receiver<Command>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut polls: FuturesUnordered<BoxFuture<'static, Envelope<Vec<Order>>>> =
        FuturesUnordered::new();
    let mut updates: FuturesUnordered<BoxFuture<'static, UpdateDone>> = FuturesUnordered::new();

    loop {
        tokio::select! {
            biased;

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            Some(result) = polls.next(), if !polls.is_empty() => {
                actor.finish_poll(result);
            }
            Some((order_id, result, reply)) = updates.next(), if !updates.is_empty() => {
                actor.finish_update(order_id, &result);
                let _ = reply.send(result);
            }
            Some(cmd) = cmd_rx.recv() => match cmd {
                Command::StatusChange { order_id, status, reply } => {
                    if let Some(fut) = actor.begin_status_change(order_id, &status, reply) {
                        updates.push(fut);
                    }
                }
                Command::Refresh => actor.start_poll(&mut polls),
            },
            _ = ticker.tick() => actor.start_poll(&mut polls),
        }
    }

    info!("order poller stopped");
}

impl Actor {
    fn now_ms(&self) -> i64 {
        duration_ms(self.epoch.elapsed())
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.held.clone());
        let _ = self.bus.send(BusMsg::Orders(self.held.clone()));
    }

    fn notice(&self, severity: NoticeSeverity, message: String) {
        let _ = self.bus.send(BusMsg::Notice { severity, message });
    }

    fn start_poll(&mut self, polls: &mut FuturesUnordered<BoxFuture<'static, Envelope<Vec<Order>>>>) {
        if !polls.is_empty() {
            debug!("poll already in flight; tick skipped");
            return;
        }
        let uc = Arc::clone(&self.deps.get_notifications);
        polls.push(Box::pin(async move { uc.execute().await }));

        self.held.phase = PollPhase::Polling;
        self.publish();
    }

    fn finish_poll(&mut self, result: Envelope<Vec<Order>>) {
        match result {
            Envelope::Ok(server) => {
                let now_ms = self.now_ms();
                let report = reconcile(
                    server,
                    &mut self.held.pending_edits,
                    now_ms,
                    self.max_overlay_age_ms,
                );
                debug!(
                    orders = report.orders.len(),
                    overlaid = report.overlaid.len(),
                    confirmed = report.confirmed.len(),
                    expired = report.expired.len(),
                    "reconciled poll"
                );
                self.held.orders = report.orders;
                self.held.phase = PollPhase::Idle;
                self.held.last_error = None;
                self.held.cycles += 1;
            }
            Envelope::Fail(msg) => {
                warn!(error = %msg, "poll failed; keeping previous orders");
                self.held.phase = PollPhase::Error;
                self.held.last_error = Some(msg.clone());
                self.held.failures += 1;
                self.notice(NoticeSeverity::Error, msg);
            }
        }
        self.publish();
    }

    /// Apply the edit locally and return the confirmation future, or reply
    /// with a validation failure without touching held state.
    fn begin_status_change(
        &mut self,
        order_id: i64,
        status: &str,
        reply: oneshot::Sender<Envelope<StatusUpdateAck>>,
    ) -> Option<BoxFuture<'static, UpdateDone>> {
        let label = match UpdateOrderStatus::validate(order_id, status) {
            Ok(label) => label,
            Err(msg) => {
                warn!(order_id, error = msg, "status change rejected");
                let _ = reply.send(Envelope::fail(msg));
                return None;
            }
        };

        if !apply_local_edit(&mut self.held.orders, order_id, &label) {
            debug!(order_id, "status change for an order not in the held set");
        }
        let now_ms = self.now_ms();
        self.held.pending_edits.record(order_id, label, now_ms);
        self.publish();

        let uc = Arc::clone(&self.deps.update_status);
        let status = status.to_string();
        Some(Box::pin(async move {
            let result = uc.execute(order_id, &status).await;
            (order_id, result, reply)
        }))
    }

    fn finish_update(&self, order_id: i64, result: &Envelope<StatusUpdateAck>) {
        match result {
            Envelope::Ok(ack) => self.notice(NoticeSeverity::Success, ack.message.clone()),
            Envelope::Fail(msg) => {
                warn!(order_id, error = %msg, "status change not confirmed; local edit kept");
                self.notice(NoticeSeverity::Error, msg.clone());
            }
        }
    }
}

fn duration_ms(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

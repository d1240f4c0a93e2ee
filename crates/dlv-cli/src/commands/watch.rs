//! `dlv watch`: run the polling loop in the foreground.
//!
//! Prints one JSON line per finished poll (success or failure) until the
//! requested number of polls is reached or ctrl-c arrives.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dlv_config::DashboardConfig;
use dlv_daemon::poller::{HeldOrders, PollPhase, PollerDeps, PollerHandle};
use dlv_feed::{FeedNotificationRepository, NotificationRepository};
use dlv_usecase::{GetNotifications, UpdateOrderStatus};
use tokio::sync::broadcast;
use tracing::info;

use super::transport;

pub async fn run(cfg: &DashboardConfig, cycles: Option<u64>) -> Result<()> {
    let repo: Arc<dyn NotificationRepository> = Arc::new(FeedNotificationRepository::new(
        transport(cfg)?,
        cfg.notification_host.clone(),
    ));
    let deps = PollerDeps {
        get_notifications: Arc::new(GetNotifications::new(Arc::clone(&repo))),
        update_status: Arc::new(UpdateOrderStatus::new(repo)),
    };

    // Notices are already logged by the poller; nobody listens on the bus here.
    let (bus, _) = broadcast::channel(16);
    let poller = PollerHandle::spawn(deps, Duration::from_secs(cfg.poll_interval_secs), bus);
    let mut view = poller.subscribe();

    let mut seen = 0u64;
    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let held = view.borrow_and_update().clone();
                let finished = held.cycles + held.failures;
                if held.phase == PollPhase::Polling || finished == seen {
                    continue;
                }
                seen = finished;
                print_snapshot(&held)?;
                if cycles.is_some_and(|n| seen >= n) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c received; stopping watch");
                break;
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}

fn print_snapshot(held: &HeldOrders) -> Result<()> {
    println!("{}", serde_json::to_string(held)?);
    Ok(())
}

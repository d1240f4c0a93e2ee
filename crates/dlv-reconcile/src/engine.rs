use dlv_feed::Order;

use crate::edits::PendingEdits;

/// Outcome of one reconciliation cycle. Id lists are ascending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Held order set after the merge, in server order.
    pub orders: Vec<Order>,
    /// Ids whose server status was overridden by a pending edit.
    pub overlaid: Vec<i64>,
    /// Ids whose pending edit the server confirmed.
    pub confirmed: Vec<i64>,
    /// Ids whose pending edit aged out unconfirmed.
    pub expired: Vec<i64>,
}

/// Merge a fresh server order set with the pending edits.
///
/// `pending` is updated in place: confirmed and expired edits are removed.
/// Edits for ids the server did not report stay pending until they expire.
pub fn reconcile(
    server: Vec<Order>,
    pending: &mut PendingEdits,
    now_ms: i64,
    max_overlay_age_ms: i64,
) -> ReconcileReport {
    let mut orders = server;
    let mut overlaid = Vec::new();
    let mut confirmed = Vec::new();
    let mut expired = Vec::new();

    let ids: Vec<i64> = pending.iter().map(|(id, _)| id).collect();
    for id in ids {
        let Some(edit) = pending.get(id).cloned() else {
            continue;
        };

        let server_confirms = orders
            .iter()
            .any(|o| o.id() == id && o.status().same_as(&edit.status));
        if server_confirms {
            pending.remove(id);
            confirmed.push(id);
            continue;
        }

        if now_ms.saturating_sub(edit.recorded_at_ms) >= max_overlay_age_ms {
            pending.remove(id);
            expired.push(id);
            continue;
        }

        let mut hit = false;
        for order in orders.iter_mut().filter(|o| o.id() == id) {
            *order = order.with_status(edit.status.clone());
            hit = true;
        }
        if hit {
            overlaid.push(id);
        }
    }

    ReconcileReport {
        orders,
        overlaid,
        confirmed,
        expired,
    }
}

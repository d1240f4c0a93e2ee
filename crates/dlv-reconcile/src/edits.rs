use std::collections::BTreeMap;

use dlv_feed::{Order, StatusLabel};
use serde::Serialize;

/// One optimistic status change awaiting server confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingEdit {
    pub status: StatusLabel,
    /// Caller clock at the time the edit was requested.
    pub recorded_at_ms: i64,
}

/// Pending edits keyed by order id. A newer edit for the same id replaces
/// the older one and restarts its age.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PendingEdits {
    edits: BTreeMap<i64, PendingEdit>,
}

impl PendingEdits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, order_id: i64, status: StatusLabel, now_ms: i64) {
        self.edits.insert(
            order_id,
            PendingEdit {
                status,
                recorded_at_ms: now_ms,
            },
        );
    }

    pub fn get(&self, order_id: i64) -> Option<&PendingEdit> {
        self.edits.get(&order_id)
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &PendingEdit)> {
        self.edits.iter().map(|(id, e)| (*id, e))
    }

    pub(crate) fn remove(&mut self, order_id: i64) -> Option<PendingEdit> {
        self.edits.remove(&order_id)
    }
}

/// Apply a status change to the held set in place.
///
/// Returns `false` if no held order has `order_id`.
pub fn apply_local_edit(held: &mut [Order], order_id: i64, status: &StatusLabel) -> bool {
    let mut found = false;
    for order in held.iter_mut().filter(|o| o.id() == order_id) {
        *order = order.with_status(status.clone());
        found = true;
    }
    found
}

//! dlv-reconcile
//!
//! Merge of server truth with optimistic local status edits.
//!
//! Rules:
//! - the server order set replaces the held set wholesale
//! - a pending edit whose status the server now reports (case-insensitive) is
//!   confirmed and dropped
//! - a pending edit at least `max_overlay_age_ms` old is expired and dropped,
//!   confirmed or not
//! - any other pending edit overrides the server status for its id
//!
//! Deterministic, pure logic. No IO, no clock: callers pass `now_ms`.

mod edits;
mod engine;

pub use edits::{apply_local_edit, PendingEdit, PendingEdits};
pub use engine::{reconcile, ReconcileReport};

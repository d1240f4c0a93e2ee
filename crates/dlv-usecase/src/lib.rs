//! dlv-usecase
//!
//! Thin validated wrappers over the repositories. This is the only layer that
//! turns an `Err` into a value: every operation returns an [`Envelope`], and
//! nothing past this crate ever sees a raw repository error.
//!
//! Use cases hold their repository explicitly; owners construct them and drop
//! them together. There is no process-wide instance.

pub mod envelope;
pub mod notifications;
pub mod orders;

pub use envelope::{Envelope, DEFAULT_FAILURE};
pub use notifications::{
    GetNotifications, UpdateOrderStatus, ERR_ORDER_ID_REQUIRED, ERR_STATUS_REQUIRED,
};
pub use orders::{
    CreateOrder, GetClientOrders, GetOrders, ERR_CLIENT_ID_REQUIRED, ERR_PRODUCT_ID_REQUIRED,
    ERR_QUANTITY_POSITIVE,
};

use dlv_feed::FeedError;

/// Log a repository failure and wrap its message. Logging never changes the
/// returned value.
pub(crate) fn fail_from<T>(use_case: &'static str, err: &FeedError, default: &str) -> Envelope<T> {
    let msg = err.to_string();
    tracing::warn!(use_case, error = %msg, "use case failed");
    if msg.trim().is_empty() {
        Envelope::fail(default)
    } else {
        Envelope::fail(msg)
    }
}

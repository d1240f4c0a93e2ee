//! dlv-feed
//!
//! Ingestion side of the delivery dashboard: the canonical [`Order`] record,
//! the notification feed parser, the order-listing normalizer, the transport
//! seam and the repositories built on top of it.
//!
//! Parsing and normalization are pure. IO lives only behind [`Transport`].

pub mod error;
pub mod message;
pub mod normalizer;
pub mod order;
pub mod parser;
pub mod repository;
pub mod transport;

pub use error::FeedError;
pub use message::{classify_message, FeedMessage, ORDER_RECEIVED_MARKER};
pub use normalizer::{normalize_client_orders, normalize_order_list};
pub use order::{Order, OrderError, StatusLabel, StatusTier};
pub use parser::{parse_feed, FeedBatch, FeedParseStats};
pub use repository::{
    FeedNotificationRepository, NewOrder, NotificationRepository, OrderRepository,
    ServiceOrderRepository, StatusUpdateAck,
};
pub use transport::{HttpTransport, Transport, TransportError};

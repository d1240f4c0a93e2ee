//! Repository-boundary error type.

use std::fmt;

use crate::order::OrderError;
use crate::transport::TransportError;

/// Errors raised by the parser, the normalizer and the repositories.
///
/// Per-element soft failures never surface here; they are counted in
/// [`crate::FeedParseStats`] instead.
#[derive(Debug)]
pub enum FeedError {
    /// The transport client failed (network, non-2xx, undecodable body).
    Transport(TransportError),
    /// The top-level response shape violates the endpoint contract.
    UnexpectedFormat { expected: &'static str },
    /// A single-order response could not be materialized.
    InvalidOrder(OrderError),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Transport(e) => write!(f, "{e}"),
            FeedError::UnexpectedFormat { expected } => {
                write!(f, "unexpected response format: expected {expected}")
            }
            FeedError::InvalidOrder(e) => write!(f, "invalid order in response: {e}"),
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeedError::Transport(e) => Some(e),
            FeedError::InvalidOrder(e) => Some(e),
            FeedError::UnexpectedFormat { .. } => None,
        }
    }
}

impl From<TransportError> for FeedError {
    fn from(e: TransportError) -> Self {
        FeedError::Transport(e)
    }
}

impl From<OrderError> for FeedError {
    fn from(e: OrderError) -> Self {
        FeedError::InvalidOrder(e)
    }
}

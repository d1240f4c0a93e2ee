//! dlv-daemon library target.
//!
//! Exposes the poller, router and state for integration tests and for
//! `dlv-cli`'s watch mode. The binary `main.rs` depends on this library target.

pub mod api_types;
pub mod poller;
pub mod routes;
pub mod state;

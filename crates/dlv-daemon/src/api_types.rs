//! Request and response types for the dlv-daemon HTTP endpoints that are not
//! plain envelopes or held-state snapshots.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// /v1/orders/:id/status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangeRequest {
    #[serde(default)]
    pub status: String,
}

// ---------------------------------------------------------------------------
// /v1/orders/refresh
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub accepted: bool,
}

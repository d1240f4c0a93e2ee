//! Axum router and all HTTP handlers for dlv-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Envelope-returning handlers always answer `200`; the
//! `success` flag carries the outcome. Path and body rejections on those
//! routes are folded into the envelope as well.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use dlv_feed::NewOrder;
use dlv_usecase::{Envelope, ERR_CLIENT_ID_REQUIRED, ERR_ORDER_ID_REQUIRED};
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::{
    api_types::{HealthResponse, RefreshResponse, StatusChangeRequest},
    state::{AppState, BusMsg},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/stream", get(stream))
        .route("/v1/orders", get(held_orders).post(create_order))
        .route("/v1/orders/all", get(all_orders))
        .route("/v1/orders/refresh", post(refresh))
        .route("/v1/orders/:id/status", post(change_status))
        .route("/v1/clients/:client_id/orders", get(client_orders))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/orders
// ---------------------------------------------------------------------------

pub(crate) async fn held_orders(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(st.poller.snapshot()))
}

// ---------------------------------------------------------------------------
// POST /v1/orders/refresh
// ---------------------------------------------------------------------------

pub(crate) async fn refresh(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    st.poller.refresh();
    info!("orders/refresh");
    (StatusCode::ACCEPTED, Json(RefreshResponse { accepted: true }))
}

// ---------------------------------------------------------------------------
// POST /v1/orders/:id/status
// ---------------------------------------------------------------------------

pub(crate) async fn change_status(
    State(st): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    body: Result<Json<StatusChangeRequest>, JsonRejection>,
) -> Response {
    let Some(id) = parse_id(&raw_id) else {
        return envelope_fail(ERR_ORDER_ID_REQUIRED);
    };
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return envelope_fail(rejection.body_text()),
    };

    info!(order_id = id, status = %req.status, "orders/status");
    let result = st.poller.request_status_change(id, &req.status).await;
    (StatusCode::OK, Json(result)).into_response()
}

// ---------------------------------------------------------------------------
// POST /v1/orders, GET /v1/orders/all
// ---------------------------------------------------------------------------

pub(crate) async fn create_order(
    State(st): State<Arc<AppState>>,
    body: Result<Json<NewOrder>, JsonRejection>,
) -> Response {
    let order = match body {
        Ok(Json(order)) => order,
        Err(rejection) => return envelope_fail(rejection.body_text()),
    };
    let result = st.create_order.execute(&order).await;
    (StatusCode::OK, Json(result)).into_response()
}

pub(crate) async fn all_orders(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(st.all_orders.execute().await))
}

// ---------------------------------------------------------------------------
// GET /v1/clients/:client_id/orders
// ---------------------------------------------------------------------------

pub(crate) async fn client_orders(
    State(st): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Response {
    let Some(client_id) = parse_id(&raw_id) else {
        return envelope_fail(ERR_CLIENT_ID_REQUIRED);
    };
    (StatusCode::OK, Json(st.client_orders.execute(client_id).await)).into_response()
}

// ---------------------------------------------------------------------------
// Envelope helpers
// ---------------------------------------------------------------------------

/// Non-numeric ids are treated like a missing id.
fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

fn envelope_fail(msg: impl Into<String>) -> Response {
    let msg = msg.into();
    warn!(error = %msg, "request rejected");
    (StatusCode::OK, Json(Envelope::<()>::fail(msg))).into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::Heartbeat { .. } => "heartbeat",
                    BusMsg::Orders(_) => "orders",
                    BusMsg::Notice { .. } => "notice",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            // lagged subscribers skip ahead; the next orders event is a full snapshot
            Err(_) => None,
        }
    })
}

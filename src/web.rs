//! Listener (§4.5): the axum `Router`, the WebSocket upgrade endpoint, and
//! the ops-facing REST surface (§6 AMBIENT).
//!
//! Grounded on the teacher's `web.rs` (`ws_upgrade`/`handle_ws`, axum
//! `Router` construction with a shared `Arc<State>`), generalized from
//! "bridge a WebSocket into an IRC line protocol" to "run a session
//! directly against the hub".

use std::sync::Arc;
use std::time::SystemTime;

use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::hub::Hub;
use crate::protocol::PeerInfo;

pub fn build_router(hub: Arc<Hub>) -> Router {
    let path = hub.config.signaling_path.clone();
    let cors = build_cors(&hub);

    Router::new()
        .route(&path, get(ws_upgrade))
        .route("/healthz", get(healthz))
        .route("/api/peers", get(list_peers))
        .fallback(reject_unknown_path)
        .layer(cors)
        .with_state(hub)
}

fn build_cors(hub: &Hub) -> CorsLayer {
    let origins = hub.config.allowed_origins();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();
        AllowOrigin::list(parsed)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
}

/// Non-matching upgrade paths never reach session logic (§4.5).
async fn reject_unknown_path(uri: Uri) -> impl IntoResponse {
    tracing::debug!(%uri, "rejected request to unknown path");
    (StatusCode::NOT_FOUND, "not found")
}

#[derive(Deserialize)]
struct HandshakeParams {
    name: Option<String>,
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(hub): State<Arc<Hub>>,
    Query(params): Query<HandshakeParams>,
) -> impl IntoResponse {
    // `name` arrives already percent-decoded by axum's `Query` extractor;
    // the spec calls this out explicitly (§6) because it's easy to forget
    // when hand-rolling query parsing instead of using an extractor.
    //
    // Sec-WebSocket-Protocol is forwarded through unchanged rather than
    // interpreted: whatever the client offers, we accept, so axum's
    // negotiation echoes it straight back instead of silently dropping it.
    let requested_protocols = headers
        .get(axum::http::header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').map(|p| p.trim().to_string()).collect::<Vec<_>>())
        .unwrap_or_default();
    let ws = ws.protocols(requested_protocols);

    ws.on_upgrade(move |socket| crate::session::run(socket, hub, params.name))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    connections: usize,
    uptime_secs: u64,
}

static START_TIME: std::sync::OnceLock<SystemTime> = std::sync::OnceLock::new();

async fn healthz(State(hub): State<Arc<Hub>>) -> Json<HealthResponse> {
    let start = START_TIME.get_or_init(SystemTime::now);
    let uptime_secs = start.elapsed().unwrap_or_default().as_secs();
    Json(HealthResponse {
        status: "ok",
        connections: hub.registry.len(),
        uptime_secs,
    })
}

async fn list_peers(State(hub): State<Arc<Hub>>) -> Json<Vec<PeerInfo>> {
    Json(hub.registry.snapshot(None))
}

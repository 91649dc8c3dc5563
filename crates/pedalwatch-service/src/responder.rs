//! HTTP telemetry bridge.
//!
//! Every GET drains the whole queue into one numbered batch. HEAD and OPTIONS
//! answer with headers only and never touch the queue.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use pedalwatch_errors::TransportError;
use pedalwatch_telemetry_streams::{BridgeEnvelope, BridgeMetrics, TelemetryFrame, TelemetryQueue};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

const CORS_HEADERS: [(&str, &str); 4] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, HEAD, OPTIONS"),
    ("access-control-allow-headers", "Content-Type"),
    ("cache-control", "no-store"),
];

/// Handles shared between the sampling thread and the responder.
#[derive(Debug, Clone)]
pub struct BridgeState {
    pub queue: Arc<TelemetryQueue<TelemetryFrame>>,
    pub metrics: Arc<BridgeMetrics>,
}

pub fn router(state: BridgeState) -> Router {
    Router::new()
        .route("/", get(serve_batch).head(headers_only).options(preflight))
        .route(
            "/telemetry",
            get(serve_batch).head(headers_only).options(preflight),
        )
        .with_state(state)
}

async fn serve_batch(State(state): State<BridgeState>) -> Response {
    let started = Instant::now();
    let envelope = BridgeEnvelope::collect(&state.queue, &state.metrics);

    let response = match serde_json::to_string(&envelope) {
        Ok(body) => (
            StatusCode::OK,
            CORS_HEADERS,
            [("content-type", "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(
                batch_id = envelope.bridge_info.batch_id,
                error = %e,
                "failed to serialize telemetry batch"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, CORS_HEADERS).into_response()
        }
    };

    let elapsed = started.elapsed();
    state.metrics.record_http_serve(elapsed);
    debug!(
        batch_id = envelope.bridge_info.batch_id,
        frames = envelope.frames.len(),
        elapsed_us = elapsed.as_micros(),
        "served telemetry batch"
    );
    response
}

/// HEAD must not fall through to `serve_batch`, which drains the queue.
async fn headers_only() -> Response {
    (
        StatusCode::OK,
        CORS_HEADERS,
        [("content-type", "application/json")],
    )
        .into_response()
}

async fn preflight() -> Response {
    (StatusCode::OK, CORS_HEADERS).into_response()
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener, TransportError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Serve until `shutdown` resolves, then let in-flight requests finish.
pub async fn serve(
    listener: TcpListener,
    state: BridgeState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), TransportError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Telemetry bridge listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(TransportError::Serve)?;
    info!("Telemetry bridge stopped");
    Ok(())
}

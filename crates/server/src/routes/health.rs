use crate::state::{ServerMetadata, ServerState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Health check endpoint (liveness)
/// Returns 200 if server is running
pub async fn health_check() -> impl IntoResponse {
    let metadata = ServerMetadata {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime_seconds(),
    };

    Json(json!({
        "status": "healthy",
        "service": "photomod-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": metadata.version,
        "uptime_seconds": metadata.uptime_seconds,
    }))
}

/// Readiness check endpoint
///
/// 200 when the staging key and the webhook URL are both configured,
/// 503 otherwise. The HEIC decoder is optional and reported for information.
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let pipeline = state.orchestrator.config();
    let staging_ready = pipeline.staging.api_key().is_some();
    let transform_ready = pipeline.transform.webhook_url().is_some();
    let ready = state.orchestrator.is_ready();

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if ready { "ready" } else { "not_ready" },
            "service": "photomod-server",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "uptime_seconds": uptime_seconds(),
            "components": {
                "staging": component(staging_ready),
                "transform": component(transform_ready),
                "heif_decoder": if state.normalizer().has_decoder() { "configured" } else { "absent" },
            }
        })),
    )
}

fn component(ready: bool) -> &'static str {
    if ready {
        "ready"
    } else {
        "not_configured"
    }
}

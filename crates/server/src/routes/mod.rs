//! API route handlers
//!
//! - `health`: liveness and readiness
//! - `photo`: photo modification and standalone HEIC conversion

pub mod health;
pub mod photo;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// Returns server information including version and available endpoints.
///
/// # Response
///
/// ```json
/// {
///   "name": "photomod",
///   "version": "0.1.0",
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "photomod",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /api/modify-photo",
            "POST /api/convert-heic",
            "GET /health",
            "GET /ready"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

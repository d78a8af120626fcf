use crate::error::{ServerError, ServerResult};
use crate::middleware::RequestId;
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use normalize::NormalizeOptions;
use photomod::{InboundPhoto, ModifyPhotoRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request to convert an image to JPEG without modifying it
#[derive(Debug, Default, Deserialize)]
pub struct ConvertHeicRequest {
    /// `data:<mime>;base64,<payload>`
    #[serde(default)]
    pub image: Option<String>,
}

/// Response from a successful conversion
#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertHeicResponse {
    pub success: bool,
    /// `data:image/jpeg;base64,...`
    pub converted_image: String,
}

/// Run a photo through the full modification pipeline.
///
/// The body is `{image, prompt, format?}`. Every pipeline outcome, success or
/// failure, is answered with the `ClientResult` JSON and its status code.
///
/// # Example
/// ```json
/// // Request
/// {"image": "data:image/heic;base64,...", "prompt": "make the sky vibrant"}
///
/// // Response
/// {
///   "success": true,
///   "modified_image": "...",
///   "processing_time": "12.4s",
///   "converted_original": "data:image/jpeg;base64,..."
/// }
/// ```
pub async fn modify_photo(
    State(state): State<Arc<ServerState>>,
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<ModifyPhotoRequest>, JsonRejection>,
) -> ServerResult<Response> {
    let Json(request) = payload.map_err(reject_body)?;

    let result = match request_id {
        Some(Extension(id)) => {
            state
                .orchestrator
                .run_with_request_id(&request, id.as_str())
                .await
        }
        None => state.orchestrator.run(&request).await,
    };

    let status = StatusCode::from_u16(result.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok((status, Json(result)).into_response())
}

/// Convert an uploaded image (typically HEIC) to a progressive JPEG data URL.
pub async fn convert_heic(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ConvertHeicRequest>, JsonRejection>,
) -> ServerResult<Json<ConvertHeicResponse>> {
    let Json(request) = payload.map_err(reject_body)?;

    let image = request
        .image
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("No image provided".to_string()))?;

    let photo = InboundPhoto::parse(&image, state.max_image_bytes())?;
    let hint = photo.hint();
    let heic = hint.is_proprietary();
    tracing::info!(mime = hint.mime(), bytes = photo.len(), heic, "convert_start");

    let normalizer = state.normalizer().clone();
    let bytes = photo.bytes().clone();
    let converted = tokio::task::spawn_blocking(move || {
        normalizer.normalize(&bytes, &hint, NormalizeOptions::final_artifact())
    })
    .await?
    .map_err(|source| ServerError::Conversion { heic, source })?;

    tracing::info!(
        width = converted.width,
        height = converted.height,
        output_len = converted.bytes.len(),
        "convert_complete"
    );

    Ok(Json(ConvertHeicResponse {
        success: true,
        converted_image: converted.to_data_url(),
    }))
}

fn reject_body(rejection: JsonRejection) -> ServerError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge
    } else {
        ServerError::MalformedBody(rejection.body_text())
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use normalize::ConversionError;
use photomod::PipelineError;
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Body could not be read as the expected JSON. The detail is logged only.
    #[error("Malformed body: {0}")]
    MalformedBody(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// `heic` records whether the input was HEIC/HEIF, which changes the
    /// client sentence.
    #[error("Conversion error: {source}")]
    Conversion {
        heic: bool,
        #[source]
        source: ConversionError,
    },

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Not found")]
    NotFound,
}

/// Error body shared by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) | ServerError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Pipeline(err) => {
                StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ServerError::Conversion { .. } | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Sentence shown to the client. Never includes internal detail.
    pub fn client_message(&self) -> String {
        match self {
            ServerError::BadRequest(msg) => msg.clone(),
            ServerError::MalformedBody(_) => {
                "Invalid request body. Please send a JSON object.".to_string()
            }
            ServerError::PayloadTooLarge => {
                "Image is too large. Please use an image under 5MB for best results.".to_string()
            }
            ServerError::Pipeline(err) => err.client_message().to_string(),
            ServerError::Conversion { heic: true, .. } => {
                "Failed to convert HEIC image. The file may be corrupted or in an unsupported format."
                    .to_string()
            }
            ServerError::Conversion { heic: false, .. } => {
                "Failed to convert image. Please try a different image.".to_string()
            }
            ServerError::Internal(_) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
            ServerError::NotFound => "Not found".to_string(),
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) | ServerError::MalformedBody(_) => "BAD_REQUEST",
            ServerError::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ServerError::Pipeline(err) => err.code(),
            ServerError::Conversion { .. } => "CONVERSION_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request_error");
        } else {
            tracing::warn!(code = self.error_code(), error = %self, "request_rejected");
        }

        let body = Json(ErrorResponse {
            success: false,
            error: self.client_message(),
        });

        (status, body).into_response()
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Internal(format!("worker task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_keep_their_status() {
        let err = ServerError::from(PipelineError::Staging);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), "STAGING_FAILURE");
    }

    #[test]
    fn heic_conversion_message_differs() {
        let heic = ServerError::Conversion {
            heic: true,
            source: ConversionError::Empty,
        };
        let other = ServerError::Conversion {
            heic: false,
            source: ConversionError::Empty,
        };
        assert_eq!(heic.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(heic.client_message().contains("HEIC"));
        assert!(!other.client_message().contains("HEIC"));
    }

    #[test]
    fn malformed_body_detail_is_not_exposed() {
        let err = ServerError::MalformedBody("expected value at line 1 column 2".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.client_message().contains("line 1"));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = ServerError::Internal("db password=hunter2".into());
        assert!(!err.client_message().contains("hunter2"));
    }
}

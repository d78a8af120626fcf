use thiserror::Error;
use transform::{FailureKind, InvokeError};

/// Everything that can stop a photo modification request.
///
/// Each variant maps to one HTTP status and one fixed client sentence; the
/// `Display` text is for logs and may include upstream detail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Image or instruction missing.
    #[error("image and prompt are required")]
    MissingInput,

    /// Image string is not a decodable data URL / base64 payload.
    #[error("invalid image payload: {0}")]
    InvalidImage(String),

    /// Image exceeds the size ceiling.
    #[error("image too large: {measured} {measure} exceeds limit of {limit}")]
    TooLarge {
        measure: &'static str,
        measured: usize,
        limit: usize,
    },

    /// A required endpoint or credential is not configured.
    #[error("missing configuration: {0}")]
    Configuration(&'static str),

    /// The staging host produced no URL.
    #[error("staging upload failed")]
    Staging,

    /// Timeout, transport failure, or non-2xx from the transformation call.
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    /// Upstream answered but without a usable image.
    #[error("transformation produced no usable result ({kind:?}): {}", .detail.as_deref().unwrap_or("-"))]
    Transformation {
        kind: FailureKind,
        detail: Option<String>,
    },
}

impl PipelineError {
    /// HTTP status for the client response.
    pub fn status(&self) -> u16 {
        match self {
            PipelineError::MissingInput | PipelineError::InvalidImage(_) => 400,
            PipelineError::TooLarge { .. } => 413,
            PipelineError::Configuration(_) => 500,
            PipelineError::Staging => 422,
            PipelineError::Invoke(err) => err.status_hint(),
            PipelineError::Transformation { kind, .. } => kind.status_hint(),
        }
    }

    /// Short human sentence; never contains upstream text.
    pub fn client_message(&self) -> &'static str {
        match self {
            PipelineError::MissingInput => "Image and prompt are required",
            PipelineError::InvalidImage(_) => {
                "Invalid image data. Please upload a valid image file."
            }
            PipelineError::TooLarge { .. } => {
                "Image is too large. Please use an image under 5MB for best results."
            }
            PipelineError::Configuration(_) => {
                "Image processing service is not configured. Please check server configuration."
            }
            PipelineError::Staging => {
                "Failed to upload image. Please try again or use a different image format."
            }
            PipelineError::Invoke(InvokeError::Timeout(_)) => {
                "Processing timeout after 3 minutes. Please try with a smaller image or simpler prompt."
            }
            PipelineError::Invoke(InvokeError::Network(_) | InvokeError::Status(_)) => {
                "Unable to connect to AI service. Please try again later."
            }
            PipelineError::Invoke(InvokeError::MissingEndpoint | InvokeError::InvalidConfig(_)) => {
                "Image processing service is not configured. Please check server configuration."
            }
            PipelineError::Transformation { kind, .. } => kind.client_message(),
        }
    }

    /// Machine-readable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::MissingInput | PipelineError::InvalidImage(_) => "VALIDATION_ERROR",
            PipelineError::TooLarge { .. } => "PAYLOAD_TOO_LARGE",
            PipelineError::Configuration(_) => "CONFIG_ERROR",
            PipelineError::Staging => "STAGING_FAILURE",
            PipelineError::Invoke(InvokeError::Timeout(_)) => "TIMEOUT",
            PipelineError::Invoke(InvokeError::MissingEndpoint | InvokeError::InvalidConfig(_)) => {
                "CONFIG_ERROR"
            }
            PipelineError::Invoke(_) => "NETWORK_ERROR",
            PipelineError::Transformation { kind, .. } => match kind {
                FailureKind::PayloadTooLarge => "UPSTREAM_PAYLOAD_TOO_LARGE",
                FailureKind::BadRequest => "UPSTREAM_BAD_REQUEST",
                FailureKind::InvalidResponse => "UPSTREAM_INVALID_RESPONSE",
                FailureKind::UpstreamError => "UPSTREAM_EXPLICIT_ERROR",
                FailureKind::NoImageProduced => "NO_IMAGE_PRODUCED",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn status_mapping() {
        let cases: Vec<(PipelineError, u16)> = vec![
            (PipelineError::MissingInput, 400),
            (
                PipelineError::TooLarge {
                    measure: "bytes",
                    measured: 6,
                    limit: 5,
                },
                413,
            ),
            (PipelineError::Configuration("webhook url"), 500),
            (PipelineError::Staging, 422),
            (InvokeError::Timeout(Duration::from_secs(180)).into(), 408),
            (InvokeError::Status(502).into(), 503),
            (
                PipelineError::Transformation {
                    kind: FailureKind::InvalidResponse,
                    detail: None,
                },
                502,
            ),
            (
                PipelineError::Transformation {
                    kind: FailureKind::PayloadTooLarge,
                    detail: None,
                },
                413,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err}");
        }
    }

    #[test]
    fn client_message_never_echoes_upstream_detail() {
        let err = PipelineError::Transformation {
            kind: FailureKind::UpstreamError,
            detail: Some("<html>Traceback (most recent call last)</html>".into()),
        };
        assert!(err.to_string().contains("Traceback"));
        assert!(!err.client_message().contains("Traceback"));
    }

    #[test]
    fn oversize_message_mentions_limit() {
        let err = PipelineError::TooLarge {
            measure: "bytes",
            measured: 6 * 1024 * 1024,
            limit: 5 * 1024 * 1024,
        };
        assert!(err.client_message().contains("under 5MB"));
    }
}

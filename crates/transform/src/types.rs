use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use staging::StagedReference;

/// Body sent to the transformation engine.
///
/// Built from a [`StagedReference`] only, so the engine can never be handed
/// inline pixel data. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformationRequest {
    #[serde(rename = "image")]
    image_url: String,
    prompt: String,
    format: String,
    #[serde(serialize_with = "rfc3339")]
    timestamp: DateTime<Utc>,
}

fn rfc3339<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}

impl TransformationRequest {
    pub fn new(staged: &StagedReference, prompt: impl Into<String>, format: impl Into<String>) -> Self {
        Self::at(staged, prompt, format, Utc::now())
    }

    pub fn at(
        staged: &StagedReference,
        prompt: impl Into<String>,
        format: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            image_url: staged.url.clone(),
            prompt: prompt.into(),
            format: format.into(),
            timestamp,
        }
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Raw upstream body plus locally measured wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub body: String,
    pub elapsed: Duration,
}

/// Why a well-formed call produced no usable image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Non-JSON body that mentions an oversized request.
    PayloadTooLarge,
    /// Non-JSON body that mentions a malformed request.
    BadRequest,
    /// Non-JSON body of unknown shape.
    InvalidResponse,
    /// JSON body with an explicit `error`.
    UpstreamError,
    /// JSON body with neither an image nor an error.
    NoImageProduced,
}

impl FailureKind {
    pub fn status_hint(self) -> u16 {
        match self {
            FailureKind::PayloadTooLarge => 413,
            FailureKind::BadRequest => 400,
            FailureKind::InvalidResponse => 502,
            FailureKind::UpstreamError | FailureKind::NoImageProduced => 422,
        }
    }

    /// Fixed sentence shown to the client.
    pub fn client_message(self) -> &'static str {
        match self {
            FailureKind::PayloadTooLarge => {
                "Image is too large for processing. Please use an image under 5MB."
            }
            FailureKind::BadRequest => {
                "Invalid request format. Please try again with a different image."
            }
            FailureKind::InvalidResponse => {
                "Received invalid response from AI service. Please try again."
            }
            FailureKind::UpstreamError => {
                "AI processing failed. Please try a different prompt or image."
            }
            FailureKind::NoImageProduced => {
                "AI processing completed but no modified image was returned. Please try a different prompt or check if your image is compatible."
            }
        }
    }
}

/// Classified upstream response. Exactly one arm is meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformationOutcome {
    Success {
        /// Inline base64, data URL, or URL; passed through as given.
        image: String,
        /// Upstream-reported processing time, if any.
        processing_time: Option<String>,
    },
    Failure {
        kind: FailureKind,
        /// Upstream text for logs only; never shown to the client.
        detail: Option<String>,
    },
}

impl TransformationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransformationOutcome::Success { .. })
    }

    pub fn status_hint(&self) -> u16 {
        match self {
            TransformationOutcome::Success { .. } => 200,
            TransformationOutcome::Failure { kind, .. } => kind.status_hint(),
        }
    }
}

/// `"5.0s"` style rendering used in client results.
pub fn format_processing_time(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}

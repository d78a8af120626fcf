use std::time::Duration;

use thiserror::Error;

/// Failures of the transformation call itself, before any classification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("transformation endpoint is not configured")]
    MissingEndpoint,
    #[error("invalid transformation configuration: {0}")]
    InvalidConfig(String),
    /// The deadline elapsed and the in-flight call was cancelled.
    #[error("transformation call timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("transformation call failed: {0}")]
    Network(String),
    #[error("transformation endpoint responded with status {0}")]
    Status(u16),
}

impl InvokeError {
    /// HTTP status reported to the client for this failure.
    pub fn status_hint(&self) -> u16 {
        match self {
            InvokeError::MissingEndpoint | InvokeError::InvalidConfig(_) => 500,
            InvokeError::Timeout(_) => 408,
            InvokeError::Network(_) | InvokeError::Status(_) => 503,
        }
    }
}

impl From<reqwest::Error> for InvokeError {
    fn from(err: reqwest::Error) -> Self {
        InvokeError::Network(err.without_url().to_string())
    }
}

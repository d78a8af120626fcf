use normalize::ConversionError;
use thiserror::Error;

/// Why a staging attempt produced no URL.
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("staging host API key is not configured")]
    MissingApiKey,
    #[error("invalid staging configuration: {0}")]
    InvalidConfig(String),
    /// The photo needed conversion before upload and it failed.
    #[error("conversion before upload failed: {0}")]
    Conversion(#[from] ConversionError),
    #[error("staging request failed: {0}")]
    Transport(String),
    #[error("staging host responded with status {status}")]
    Status { status: u16, body: String },
    #[error("staging host returned an unreadable body: {0}")]
    InvalidResponse(String),
    /// Well-formed envelope with `success: false` or no URL.
    #[error("staging host rejected upload: {message}")]
    Rejected { message: String, code: Option<i64> },
    #[error("internal staging error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for StagingError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key.
        StagingError::Transport(err.without_url().to_string())
    }
}

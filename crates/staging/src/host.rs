use async_trait::async_trait;
use reqwest::multipart::Form;
use tracing::debug;

use crate::config::StagingConfig;
use crate::error::StagingError;
use crate::types::{StagedReference, UploadEnvelope};

/// Longest slice of an error body kept for logs.
const MAX_LOGGED_BODY: usize = 500;

/// Anything that turns a base64 payload into a public URL.
#[async_trait]
pub trait StagingHost: Send + Sync {
    /// Upload `payload_b64` (no data-URL prefix). One attempt, no retry.
    async fn upload(&self, payload_b64: String) -> Result<StagedReference, StagingError>;
}

/// imgbb-compatible upload API.
///
/// `POST {endpoint}?key=..&expiration=..` with a single multipart text field
/// named `image`.
#[derive(Debug, Clone)]
pub struct ImgbbHost {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    expiration_secs: u64,
}

impl ImgbbHost {
    pub fn new(cfg: &StagingConfig) -> Result<Self, StagingError> {
        let api_key = cfg.api_key().ok_or(StagingError::MissingApiKey)?.to_string();
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()
            .map_err(|e| StagingError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
            api_key,
            expiration_secs: cfg.expiration_secs,
        })
    }
}

#[async_trait]
impl StagingHost for ImgbbHost {
    async fn upload(&self, payload_b64: String) -> Result<StagedReference, StagingError> {
        debug!(payload_len = payload_b64.len(), "staging_upload_start");

        let expiration = self.expiration_secs.to_string();
        let form = Form::new().text("image", payload_b64);
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str()), ("expiration", expiration.as_str())])
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(StagingError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_LOGGED_BODY),
            });
        }

        let envelope: UploadEnvelope = serde_json::from_str(&body)
            .map_err(|e| StagingError::InvalidResponse(e.to_string()))?;
        envelope.into_reference(self.expiration_secs)
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

//! Staging uploads.
//!
//! The transformation engine only ever receives a URL, so every photo is first
//! pushed to a binary staging host that hands back a short-lived public link.
//! HEIC/HEIF input is converted to JPEG before upload; if that conversion
//! fails the upload is abandoned.
//!
//! Failures are reported as `None` from [`Uploader::stage`]; the detailed
//! [`StagingError`] is logged and also available via [`Uploader::try_stage`].

use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use normalize::{EncodingHint, NormalizeOptions, Normalizer};
use tracing::{error, info};

mod config;
mod error;
mod host;
mod types;

pub use crate::config::StagingConfig;
pub use crate::error::StagingError;
pub use crate::host::{ImgbbHost, StagingHost};
pub use crate::types::{StagedReference, UploadEnvelope};

/// Normalizes when needed, then uploads once.
#[derive(Clone)]
pub struct Uploader {
    host: Arc<dyn StagingHost>,
    normalizer: Normalizer,
}

impl Uploader {
    pub fn new(host: Arc<dyn StagingHost>, normalizer: Normalizer) -> Self {
        Self { host, normalizer }
    }

    /// Stage `bytes`, returning `None` on any failure.
    pub async fn stage(&self, bytes: &[u8], declared_mime: &str) -> Option<StagedReference> {
        let start = Instant::now();
        match self.try_stage(bytes, declared_mime).await {
            Ok(staged) => {
                info!(
                    url = %staged.url,
                    expires_in_secs = staged.expires_in.map(|d| d.as_secs()),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "staging_success"
                );
                Some(staged)
            }
            Err(err) => {
                error!(
                    error = %err,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "staging_failure"
                );
                None
            }
        }
    }

    pub async fn try_stage(
        &self,
        bytes: &[u8],
        declared_mime: &str,
    ) -> Result<StagedReference, StagingError> {
        let hint = EncodingHint::resolve(declared_mime, bytes);
        let payload = if hint.is_proprietary() {
            info!(mime = hint.mime(), "staging_converting_before_upload");
            let normalizer = self.normalizer.clone();
            let owned = bytes.to_vec();
            let photo = tokio::task::spawn_blocking(move || {
                normalizer.normalize(&owned, &hint, NormalizeOptions::final_artifact())
            })
            .await
            .map_err(|e| StagingError::Internal(format!("conversion task failed: {e}")))??;
            photo.to_base64()
        } else {
            STANDARD.encode(bytes)
        };

        self.host.upload(payload).await
    }
}

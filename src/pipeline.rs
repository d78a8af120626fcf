//! Request orchestration: validate → preview → stage → invoke → classify.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use normalize::{EncodingHint, NormalizeOptions, Normalizer};
use staging::{ImgbbHost, StagingHost, Uploader};
use tracing::{error, info, warn, Instrument};
use transform::{
    classify, format_processing_time, Invoker, TransformEngine, TransformationOutcome,
    TransformationRequest, WebhookEngine,
};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::inbound::InboundPhoto;
use crate::result::{ClientResult, ModifyPhotoRequest};

/// Image and timing of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifiedPhoto {
    pub image: String,
    pub processing_time: String,
}

/// Runs one photo modification request end to end.
///
/// Steps are strictly sequential and nothing is retried. Collaborators are
/// optional so that a missing credential or endpoint surfaces as a
/// configuration error on the request that needs it.
#[derive(Clone)]
pub struct Orchestrator {
    config: Arc<PipelineConfig>,
    normalizer: Normalizer,
    uploader: Option<Uploader>,
    invoker: Option<Invoker>,
}

impl Orchestrator {
    /// Build real collaborators from configuration.
    pub fn new(config: PipelineConfig) -> Self {
        let normalizer = Normalizer::from_config(&config.normalize);

        let host: Option<Arc<dyn StagingHost>> = match ImgbbHost::new(&config.staging) {
            Ok(host) => Some(Arc::new(host)),
            Err(err) => {
                warn!(error = %err, "staging_host_unavailable");
                None
            }
        };
        let engine: Option<Arc<dyn TransformEngine>> = match WebhookEngine::new(&config.transform)
        {
            Ok(engine) => Some(Arc::new(engine)),
            Err(err) => {
                warn!(error = %err, "transform_engine_unavailable");
                None
            }
        };

        Self::with_collaborators(config, normalizer, host, engine)
    }

    /// Build with explicit collaborators; `None` means "not configured".
    pub fn with_collaborators(
        config: PipelineConfig,
        normalizer: Normalizer,
        host: Option<Arc<dyn StagingHost>>,
        engine: Option<Arc<dyn TransformEngine>>,
    ) -> Self {
        let uploader = host.map(|host| Uploader::new(host, normalizer.clone()));
        let invoker = engine.map(|engine| Invoker::new(engine, config.transform.deadline()));
        Self {
            config: Arc::new(config),
            normalizer,
            uploader,
            invoker,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Both external dependencies are configured.
    pub fn is_ready(&self) -> bool {
        self.uploader.is_some() && self.invoker.is_some()
    }

    /// Run a request and map every outcome into a [`ClientResult`].
    ///
    /// A preview produced for HEIC input is attached whatever happens after
    /// it, so the client always has something renderable.
    pub async fn run(&self, request: &ModifyPhotoRequest) -> ClientResult {
        let request_id = format!("req-{}", NEXT_REQUEST.fetch_add(1, Ordering::Relaxed));
        self.run_with_request_id(request, &request_id).await
    }

    /// Same as [`run`](Self::run) with a caller-supplied correlation id.
    pub async fn run_with_request_id(
        &self,
        request: &ModifyPhotoRequest,
        request_id: &str,
    ) -> ClientResult {
        let span = tracing::info_span!(
            "photomod.run",
            request_id = %request_id,
            format = non_blank(&request.format).unwrap_or(&self.config.default_format)
        );
        async {
            let start = Instant::now();
            let mut preview = None;
            let outcome = self.execute(request, &mut preview).await;

            let mut result = match outcome {
                Ok(done) => {
                    info!(
                        processing_time = %done.processing_time,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "request_success"
                    );
                    ClientResult::success(done.image, done.processing_time)
                }
                Err(err) => {
                    error!(
                        code = err.code(),
                        status = err.status(),
                        error = %err,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "request_failure"
                    );
                    ClientResult::failure(&err)
                }
            };
            result.converted_original = preview;
            result
        }
        .instrument(span)
        .await
    }

    /// Pipeline body; `preview` is filled as soon as it exists.
    pub async fn execute(
        &self,
        request: &ModifyPhotoRequest,
        preview: &mut Option<String>,
    ) -> Result<ModifiedPhoto, PipelineError> {
        let (image, prompt) = match (non_blank(&request.image), non_blank(&request.prompt)) {
            (Some(image), Some(prompt)) => (image, prompt),
            _ => {
                warn!("validate_failure_missing_input");
                return Err(PipelineError::MissingInput);
            }
        };
        let format = non_blank(&request.format).unwrap_or(&self.config.default_format);

        let photo = InboundPhoto::parse(image, self.config.max_image_bytes).inspect_err(|err| {
            warn!(error = %err, "validate_failure");
        })?;
        info!(
            mime = photo.mime(),
            bytes = photo.len(),
            encoded_len = photo.encoded_len(),
            prompt_len = prompt.len(),
            "request_validated"
        );

        let uploader = self
            .uploader
            .as_ref()
            .ok_or(PipelineError::Configuration("staging host API key"))?;
        let invoker = self
            .invoker
            .as_ref()
            .ok_or(PipelineError::Configuration("transformation webhook URL"))?;

        let hint = photo.hint();
        if hint.is_proprietary() {
            *preview = self.preview(photo.bytes().clone(), hint).await;
        }

        // The original goes to staging, not the preview copy.
        let staged = uploader
            .stage(photo.bytes(), photo.mime())
            .await
            .ok_or(PipelineError::Staging)?;

        let transform_request = TransformationRequest::new(&staged, prompt, format);
        let invocation = invoker.invoke(&transform_request).await?;

        match classify(&invocation.body) {
            TransformationOutcome::Success {
                image,
                processing_time,
            } => {
                let processing_time = processing_time
                    .unwrap_or_else(|| format_processing_time(invocation.elapsed));
                info!(
                    image_len = image.len(),
                    processing_time = %processing_time,
                    "transform_complete"
                );
                Ok(ModifiedPhoto {
                    image,
                    processing_time,
                })
            }
            TransformationOutcome::Failure { kind, detail } => {
                warn!(kind = ?kind, detail = detail.as_deref().unwrap_or(""), "transform_unusable");
                Err(PipelineError::Transformation { kind, detail })
            }
        }
    }

    /// Best-effort JPEG copy for display. Failure degrades to no preview.
    async fn preview(&self, bytes: Bytes, hint: EncodingHint) -> Option<String> {
        let normalizer = self.normalizer.clone();
        let converted = tokio::task::spawn_blocking(move || {
            normalizer.normalize(&bytes, &hint, NormalizeOptions::preview())
        })
        .await;

        match converted {
            Ok(Ok(photo)) => {
                info!(width = photo.width, height = photo.height, "preview_converted");
                Some(photo.to_data_url())
            }
            Ok(Err(err)) => {
                warn!(error = %err, "preview_conversion_failed");
                None
            }
            Err(err) => {
                warn!(error = %err, "preview_conversion_failed");
                None
            }
        }
    }
}

static NEXT_REQUEST: AtomicU64 = AtomicU64::new(1);

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

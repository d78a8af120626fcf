//! Workspace umbrella crate for the photo modification pipeline.
//!
//! This crate stitches the stage crates together behind a single entry point,
//! [`Orchestrator::run`]:
//!
//! 1. validate the inbound data URL and enforce the size ceiling,
//! 2. build a JPEG preview when the upload is HEIC/HEIF ([`normalize`]),
//! 3. stage the photo on a temporary public host ([`staging`]),
//! 4. ask the external engine for the edit under a deadline ([`transform`]),
//! 5. classify the engine's reply into a [`ClientResult`].
//!
//! Nothing is persisted and nothing is retried. Every failure becomes a
//! [`ClientResult`] with a fixed client sentence and an HTTP status.

pub mod config;
pub mod error;
pub mod inbound;
pub mod pipeline;
pub mod result;

pub use normalize::{
    CommandDecoder, ConversionError, DecodePath, EncodingHint, HeifDecoder, NormalizeConfig,
    NormalizeOptions, NormalizedPhoto, Normalizer,
};
pub use staging::{
    ImgbbHost, StagedReference, StagingConfig, StagingError, StagingHost, Uploader,
};
pub use transform::{
    FailureKind, Invocation, InvokeError, Invoker, TransformConfig, TransformEngine,
    TransformationOutcome, TransformationRequest, WebhookEngine, classify,
    format_processing_time,
};

pub use crate::config::{ConfigLoadError, PipelineConfig};
pub use crate::error::PipelineError;
pub use crate::inbound::{ENCODING_OVERHEAD, InboundPhoto, MAX_IMAGE_BYTES, max_encoded_len};
pub use crate::pipeline::{ModifiedPhoto, Orchestrator};
pub use crate::result::{ClientResult, ModifyPhotoRequest};

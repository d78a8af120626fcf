//! Delegated photo transformation.
//!
//! The actual editing is done by an external workflow engine. This crate owns
//! the two pieces around that call:
//!
//! - [`Invoker`] sends a [`TransformationRequest`] under a hard deadline
//!   (180 s by default) and measures wall-clock time;
//! - [`classify`] turns whatever came back into a [`TransformationOutcome`].
//!
//! ```
//! use transform::{classify, FailureKind, TransformationOutcome};
//!
//! let outcome = classify(r#"{"success": true}"#);
//! assert_eq!(
//!     outcome,
//!     TransformationOutcome::Failure { kind: FailureKind::NoImageProduced, detail: None }
//! );
//! ```

mod classify;
mod config;
mod error;
mod invoker;
mod types;

pub use crate::classify::{
    classify, ERROR_FIELD, IMAGE_FIELDS, NON_JSON_SIGNATURES, PROCESSING_TIME_FIELD,
};
pub use crate::config::TransformConfig;
pub use crate::error::InvokeError;
pub use crate::invoker::{Invoker, TransformEngine, WebhookEngine};
pub use crate::types::{
    format_processing_time, FailureKind, Invocation, TransformationOutcome, TransformationRequest,
};

//! Maps an arbitrary upstream body onto a [`TransformationOutcome`].
//!
//! Decision order:
//! 1. strict JSON parse; on failure scan [`NON_JSON_SIGNATURES`] in order,
//!    falling back to [`FailureKind::InvalidResponse`];
//! 2. an explicit `error` field wins over any image field;
//! 3. the first non-empty entry of [`IMAGE_FIELDS`] is the image;
//! 4. nothing usable is [`FailureKind::NoImageProduced`], even if upstream
//!    said `success: true`.

use serde_json::{Map, Value};

use crate::types::{FailureKind, TransformationOutcome};

/// Accepted image keys, highest priority first.
pub const IMAGE_FIELDS: &[&str] = &["result", "modified_image"];

pub const ERROR_FIELD: &str = "error";

pub const PROCESSING_TIME_FIELD: &str = "processing_time";

/// Substrings recognised in non-JSON bodies, checked in order.
pub const NON_JSON_SIGNATURES: &[(&str, FailureKind)] = &[
    ("Request Entity Too Large", FailureKind::PayloadTooLarge),
    ("413", FailureKind::PayloadTooLarge),
    ("Bad Request", FailureKind::BadRequest),
    ("400", FailureKind::BadRequest),
];

/// Longest slice of a raw body kept as failure detail.
const MAX_DETAIL_CHARS: usize = 200;

pub fn classify(raw: &str) -> TransformationOutcome {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(fields)) => classify_fields(&fields),
        Ok(_) => TransformationOutcome::Failure {
            kind: FailureKind::NoImageProduced,
            detail: Some("response is not a JSON object".into()),
        },
        Err(_) => classify_non_json(raw),
    }
}

fn classify_non_json(raw: &str) -> TransformationOutcome {
    let kind = NON_JSON_SIGNATURES
        .iter()
        .find(|(needle, _)| raw.contains(needle))
        .map(|(_, kind)| *kind)
        .unwrap_or(FailureKind::InvalidResponse);
    TransformationOutcome::Failure {
        kind,
        detail: Some(excerpt(raw)),
    }
}

fn classify_fields(fields: &Map<String, Value>) -> TransformationOutcome {
    if let Some(err) = fields.get(ERROR_FIELD).and_then(error_text) {
        return TransformationOutcome::Failure {
            kind: FailureKind::UpstreamError,
            detail: Some(err),
        };
    }

    let image = IMAGE_FIELDS
        .iter()
        .filter_map(|key| fields.get(*key))
        .find_map(non_empty_str);

    match image {
        Some(image) => TransformationOutcome::Success {
            image: image.to_string(),
            processing_time: fields.get(PROCESSING_TIME_FIELD).and_then(processing_time),
        },
        None => TransformationOutcome::Failure {
            kind: FailureKind::NoImageProduced,
            detail: None,
        },
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}

/// Anything other than `null`, `false`, or an empty string counts as an error.
fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(excerpt(s)),
        other => Some(excerpt(&other.to_string())),
    }
}

fn processing_time(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(format!("{n}s")),
        _ => None,
    }
}

fn excerpt(s: &str) -> String {
    s.chars().take(MAX_DETAIL_CHARS).collect()
}

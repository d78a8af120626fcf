use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StagingError;

/// Public, time-limited URL standing in for uploaded bytes.
///
/// Owned by one request and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedReference {
    pub url: String,
    /// Expiration window declared by the issuing host, if it reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<Duration>,
}

/// Upload response envelope.
///
/// Success: `{"success": true, "data": {"url": ...}}`.
/// Failure: `{"success": false, "error": {"message": ..., "code": ...}}`.
#[derive(Debug, Deserialize)]
pub struct UploadEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub data: Option<UploadData>,
    #[serde(default)]
    pub error: Option<UploadFailure>,
}

#[derive(Debug, Deserialize)]
pub struct UploadData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub display_url: Option<String>,
    /// Seconds, sent either as a number or a numeric string.
    #[serde(default)]
    pub expiration: Option<Value>,
    #[serde(default)]
    pub image: Option<UploadedFile>,
}

#[derive(Debug, Deserialize)]
pub struct UploadedFile {
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadFailure {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

impl UploadEnvelope {
    /// Accept only `success: true` with a non-empty `data.url`.
    pub fn into_reference(self, requested_expiration: u64) -> Result<StagedReference, StagingError> {
        if !self.success {
            let (message, code) = match self.error {
                Some(UploadFailure { message, code }) => (
                    message.unwrap_or_else(|| "upload rejected".to_string()),
                    code,
                ),
                None => ("upload rejected".to_string(), None),
            };
            return Err(StagingError::Rejected { message, code });
        }

        let data = self.data.ok_or_else(|| StagingError::Rejected {
            message: "response has no data".into(),
            code: None,
        })?;

        let url = data
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| StagingError::Rejected {
                message: "response has no url".into(),
                code: None,
            })?;

        let expires_in = data
            .expiration
            .as_ref()
            .and_then(parse_seconds)
            .or(Some(requested_expiration))
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(StagedReference { url, expires_in })
    }
}

fn parse_seconds(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: &str) -> UploadEnvelope {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn success_envelope_yields_reference() {
        let env = envelope(
            r#"{"success":true,"status":200,"data":{"id":"abc","url":"https://i.ibb.co/abc/p.jpg","expiration":"600","image":{"mime":"image/jpeg","extension":"jpg"}}}"#,
        );
        let staged = env.into_reference(600).unwrap();
        assert_eq!(staged.url, "https://i.ibb.co/abc/p.jpg");
        assert_eq!(staged.expires_in, Some(Duration::from_secs(600)));
    }

    #[test]
    fn numeric_expiration_is_accepted() {
        let env = envelope(r#"{"success":true,"data":{"url":"https://x/y.jpg","expiration":300}}"#);
        assert_eq!(
            env.into_reference(600).unwrap().expires_in,
            Some(Duration::from_secs(300))
        );
    }

    #[test]
    fn failure_envelope_is_rejected_with_message() {
        let env = envelope(r#"{"success":false,"status":400,"error":{"message":"bad key","code":100}}"#);
        match env.into_reference(600) {
            Err(StagingError::Rejected { message, code }) => {
                assert_eq!(message, "bad key");
                assert_eq!(code, Some(100));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn success_without_url_is_rejected() {
        let env = envelope(r#"{"success":true,"data":{"url":""}}"#);
        assert!(matches!(
            env.into_reference(600),
            Err(StagingError::Rejected { .. })
        ));
    }
}

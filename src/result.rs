use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Client request body for a photo modification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyPhotoRequest {
    /// `data:<mime>;base64,<payload>`
    #[serde(default)]
    pub image: Option<String>,
    /// Natural-language edit instruction.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Desired output format; the configured default when absent.
    #[serde(default)]
    pub format: Option<String>,
}

impl ModifyPhotoRequest {
    pub fn new(image: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
            prompt: Some(prompt.into()),
            format: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// Response contract returned to the client.
///
/// `status` is the HTTP status the surface should use and is not serialized.
/// `converted_original` is only ever a JPEG data URL, never the HEIC original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientResult {
    #[serde(skip)]
    pub status: u16,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_original: Option<String>,
}

impl ClientResult {
    pub fn success(modified_image: String, processing_time: String) -> Self {
        Self {
            status: 200,
            success: true,
            modified_image: Some(modified_image),
            processing_time: Some(processing_time),
            error: None,
            converted_original: None,
        }
    }

    pub fn failure(err: &PipelineError) -> Self {
        Self {
            status: err.status(),
            success: false,
            modified_image: None,
            processing_time: None,
            error: Some(err.client_message().to_string()),
            converted_original: None,
        }
    }
}

impl From<PipelineError> for ClientResult {
    fn from(err: PipelineError) -> Self {
        ClientResult::failure(&err)
    }
}

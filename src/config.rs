//! Pipeline configuration.
//!
//! Process-wide settings injected into the [`Orchestrator`](crate::Orchestrator)
//! at construction and read-only afterwards. With the `yaml` feature the whole
//! structure can be loaded from a file:
//!
//! ```yaml
//! version: "1.0"
//!
//! max_image_bytes: 5242880
//! default_format: "jpeg"
//!
//! staging:
//!   api_key: "..."
//!   endpoint: "https://api.imgbb.com/1/upload"
//!   expiration_secs: 600
//!
//! transform:
//!   webhook_url: "https://n8n.example.com/webhook/photo-edit"
//!   timeout_secs: 180
//!
//! normalize:
//!   decoder_program: "magick"
//!   decoder_timeout_secs: 60
//! ```
//!
//! The staging key and webhook URL may be left out; their absence is only an
//! error when a request actually needs them.

use normalize::NormalizeConfig;
use serde::{Deserialize, Serialize};
use staging::StagingConfig;
use thiserror::Error;
use transform::TransformConfig;

use crate::inbound::MAX_IMAGE_BYTES;

/// Errors that can occur when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[cfg(feature = "yaml")]
    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Configuration format version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Ceiling on the decoded inbound image.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    /// Output format requested from the engine when the client sends none.
    #[serde(default = "default_format")]
    pub default_format: String,

    #[serde(default)]
    pub staging: StagingConfig,

    #[serde(default)]
    pub transform: TransformConfig,

    #[serde(default)]
    pub normalize: NormalizeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            max_image_bytes: default_max_image_bytes(),
            default_format: default_format(),
            staging: StagingConfig::default(),
            transform: TransformConfig::default(),
            normalize: NormalizeConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a YAML configuration file from the given path.
    #[cfg(feature = "yaml")]
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string.
    #[cfg(feature = "yaml")]
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks only; missing credentials are a request-time error.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }
        if self.max_image_bytes == 0 {
            return Err(ConfigLoadError::Validation(
                "max_image_bytes must be > 0".into(),
            ));
        }
        if self.transform.timeout_secs == 0 {
            return Err(ConfigLoadError::Validation(
                "transform.timeout_secs must be > 0".into(),
            ));
        }
        if self.staging.endpoint.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "staging.endpoint must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Both request-time dependencies are present.
    pub fn is_complete(&self) -> bool {
        self.staging.api_key().is_some() && self.transform.webhook_url().is_some()
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_max_image_bytes() -> usize {
    MAX_IMAGE_BYTES
}

fn default_format() -> String {
    "jpeg".to_string()
}

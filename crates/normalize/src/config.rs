use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decoder::{default_args, DEFAULT_DECODER_TIMEOUT};

/// Runtime configuration for the normalizer.
///
/// ```rust
/// use normalize::NormalizeConfig;
///
/// let cfg = NormalizeConfig::default();
/// assert_eq!(cfg.decoder_program.as_deref(), Some("magick"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// External HEIC/HEIF converter. `None` disables the dedicated decoder,
    /// leaving only the general codec.
    #[serde(default = "default_decoder_program")]
    pub decoder_program: Option<String>,

    /// Arguments for the converter; `{quality}` is substituted per call.
    #[serde(default = "default_args")]
    pub decoder_args: Vec<String>,

    /// Seconds the converter may run before it is killed.
    #[serde(default = "default_decoder_timeout_secs")]
    pub decoder_timeout_secs: u64,
}

impl NormalizeConfig {
    /// Converter deadline; never zero.
    pub fn decoder_timeout(&self) -> Duration {
        Duration::from_secs(self.decoder_timeout_secs.max(1))
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            decoder_program: default_decoder_program(),
            decoder_args: default_args(),
            decoder_timeout_secs: default_decoder_timeout_secs(),
        }
    }
}

fn default_decoder_timeout_secs() -> u64 {
    DEFAULT_DECODER_TIMEOUT.as_secs()
}

fn default_decoder_program() -> Option<String> {
    Some("magick".to_string())
}

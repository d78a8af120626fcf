use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Staging host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StagingConfig {
    /// Host API key. Required at request time, not at startup.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Upload endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Lifetime requested for the public URL, in seconds.
    #[serde(default = "default_expiration_secs")]
    pub expiration_secs: u64,

    /// Upper bound for one upload request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            expiration_secs: default_expiration_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl StagingConfig {
    /// API key with surrounding whitespace removed; `None` when blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_endpoint() -> String {
    "https://api.imgbb.com/1/upload".to_string()
}

fn default_expiration_secs() -> u64 {
    600
}

fn default_timeout_secs() -> u64 {
    60
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Transformation engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransformConfig {
    /// Workflow webhook URL. Required at request time, not at startup.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Hard ceiling on one transformation call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// TCP connect timeout, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl TransformConfig {
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    180
}

fn default_connect_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deadline_is_three_minutes() {
        assert_eq!(TransformConfig::default().deadline(), Duration::from_secs(180));
    }

    #[test]
    fn blank_url_counts_as_missing() {
        let cfg = TransformConfig {
            webhook_url: Some(" ".into()),
            ..Default::default()
        };
        assert!(cfg.webhook_url().is_none());
    }
}

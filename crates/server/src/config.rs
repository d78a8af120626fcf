use photomod::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Fallback variable for the staging host key.
pub const IMGBB_API_KEY_VAR: &str = "IMGBB_API_KEY";

/// Fallback variable for the transformation webhook.
pub const N8N_WEBHOOK_URL_VAR: &str = "N8N_WEBHOOK_URL";

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Outer request timeout in seconds; must exceed the transform deadline
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level / `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Pipeline settings handed to the orchestrator
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server` config file and
    /// `PHOTOMOD__*` environment variables, in increasing precedence.
    pub fn load() -> anyhow::Result<Self> {
        // A missing .env is normal outside development.
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("PHOTOMOD").separator("__"));

        let mut config: ServerConfig = builder.build()?.try_deserialize()?;
        config.apply_env_fallbacks(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// Fill the staging key and webhook URL from their conventional variable
    /// names when the namespaced ones were not set.
    pub fn apply_env_fallbacks<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.pipeline.staging.api_key().is_none() {
            if let Some(key) = lookup(IMGBB_API_KEY_VAR).filter(|v| !v.trim().is_empty()) {
                self.pipeline.staging.api_key = Some(key);
            }
        }
        if self.pipeline.transform.webhook_url().is_none() {
            if let Some(url) = lookup(N8N_WEBHOOK_URL_VAR).filter(|v| !v.trim().is_empty()) {
                self.pipeline.transform.webhook_url = Some(url);
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.pipeline.validate()?;
        let deadline = self.pipeline.transform.deadline();
        if self.timeout() <= deadline {
            anyhow::bail!(
                "timeout_secs ({}) must exceed the transform deadline ({}s)",
                self.timeout_secs,
                deadline.as_secs()
            );
        }
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    200
}

// 5 MiB image × 1.37 base64/data-URL overhead, plus JSON framing.
fn default_max_body_size_mb() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use photomod::max_encoded_len;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.timeout_secs, 200);
        assert!(cfg.enable_cors);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn body_limit_fits_largest_accepted_image() {
        let cfg = ServerConfig::default();
        assert!(cfg.max_body_size() > max_encoded_len(cfg.pipeline.max_image_bytes));
    }

    #[test]
    fn outer_timeout_must_exceed_transform_deadline() {
        let cfg = ServerConfig {
            timeout_secs: 180,
            ..ServerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn fallback_variables_fill_missing_values() {
        let mut cfg = ServerConfig::default();
        cfg.apply_env_fallbacks(|name| match name {
            IMGBB_API_KEY_VAR => Some("key-123".into()),
            N8N_WEBHOOK_URL_VAR => Some("http://n8n.local/webhook/edit".into()),
            _ => None,
        });
        assert_eq!(cfg.pipeline.staging.api_key(), Some("key-123"));
        assert_eq!(
            cfg.pipeline.transform.webhook_url(),
            Some("http://n8n.local/webhook/edit")
        );
        assert!(cfg.pipeline.is_complete());
    }

    #[test]
    fn namespaced_values_win_over_fallbacks() {
        let mut cfg = ServerConfig::default();
        cfg.pipeline.staging.api_key = Some("explicit".into());
        cfg.apply_env_fallbacks(|_| Some("fallback".into()));
        assert_eq!(cfg.pipeline.staging.api_key(), Some("explicit"));
    }

    #[test]
    fn blank_fallbacks_are_ignored() {
        let mut cfg = ServerConfig::default();
        cfg.apply_env_fallbacks(|_| Some("  ".into()));
        assert!(!cfg.pipeline.is_complete());
    }
}

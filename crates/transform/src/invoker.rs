use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::TransformConfig;
use crate::error::InvokeError;
use crate::types::{Invocation, TransformationRequest};

/// Something that runs a transformation and returns the raw response body.
///
/// Implementations do not enforce a deadline; [`Invoker`] does.
#[async_trait]
pub trait TransformEngine: Send + Sync {
    async fn send(&self, request: &TransformationRequest) -> Result<String, InvokeError>;
}

/// Workflow webhook reached with `POST <url>` and a JSON body.
#[derive(Debug, Clone)]
pub struct WebhookEngine {
    client: reqwest::Client,
    url: String,
}

impl WebhookEngine {
    pub fn new(cfg: &TransformConfig) -> Result<Self, InvokeError> {
        let url = cfg.webhook_url().ok_or(InvokeError::MissingEndpoint)?.to_string();
        let client = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout())
            .build()
            .map_err(|e| InvokeError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl TransformEngine for WebhookEngine {
    async fn send(&self, request: &TransformationRequest) -> Result<String, InvokeError> {
        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InvokeError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

/// Runs one call against the engine under a hard deadline.
#[derive(Clone)]
pub struct Invoker {
    engine: Arc<dyn TransformEngine>,
    deadline: Duration,
}

impl Invoker {
    pub fn new(engine: Arc<dyn TransformEngine>, deadline: Duration) -> Self {
        Self { engine, deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Send `request`, cancelling it if the deadline passes first.
    ///
    /// On timeout the in-flight future is dropped, which aborts the HTTP
    /// request and returns its connection.
    pub async fn invoke(&self, request: &TransformationRequest) -> Result<Invocation, InvokeError> {
        let start = Instant::now();
        debug!(
            image_url = request.image_url(),
            format = request.format(),
            deadline_secs = self.deadline.as_secs(),
            "transform_invoke_start"
        );

        let body = match tokio::time::timeout(self.deadline, self.engine.send(request)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    deadline_secs = self.deadline.as_secs(),
                    "transform_timeout"
                );
                return Err(InvokeError::Timeout(self.deadline));
            }
        };

        let elapsed = start.elapsed();
        debug!(
            elapsed_ms = elapsed.as_millis() as u64,
            body_len = body.len(),
            "transform_invoke_complete"
        );
        Ok(Invocation { body, elapsed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staging::StagedReference;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn request() -> TransformationRequest {
        let staged = StagedReference {
            url: "https://i.example/a.jpg".into(),
            expires_in: None,
        };
        TransformationRequest::new(&staged, "make sky vibrant", "jpeg")
    }

    struct SlowEngine {
        delay: Duration,
        finished: Arc<AtomicBool>,
    }

    #[async_trait]
    impl TransformEngine for SlowEngine {
        async fn send(&self, _: &TransformationRequest) -> Result<String, InvokeError> {
            tokio::time::sleep(self.delay).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(r#"{"result":"late"}"#.into())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn call_past_deadline_is_cancelled_with_timeout() {
        let finished = Arc::new(AtomicBool::new(false));
        let invoker = Invoker::new(
            Arc::new(SlowEngine {
                delay: Duration::from_secs(181),
                finished: finished.clone(),
            }),
            Duration::from_secs(180),
        );

        let err = invoker.invoke(&request()).await.unwrap_err();
        assert_eq!(err, InvokeError::Timeout(Duration::from_secs(180)));

        // The dropped call never completes.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn call_within_deadline_returns_body() {
        let finished = Arc::new(AtomicBool::new(false));
        let invoker = Invoker::new(
            Arc::new(SlowEngine {
                delay: Duration::from_secs(5),
                finished: finished.clone(),
            }),
            Duration::from_secs(180),
        );

        let invocation = invoker.invoke(&request()).await.unwrap();
        assert_eq!(invocation.body, r#"{"result":"late"}"#);
        assert_eq!(invocation.elapsed.as_secs(), 5);
        assert!(finished.load(Ordering::SeqCst));
    }

    #[test]
    fn webhook_engine_requires_url() {
        let err = WebhookEngine::new(&TransformConfig::default()).unwrap_err();
        assert_eq!(err, InvokeError::MissingEndpoint);
    }
}

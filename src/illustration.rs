//! Image provider client
//!
//! Fetches story illustrations through the image proxy. Transient failures
//! are retried with exponential backoff; anything else falls back to a
//! locally drawn placeholder, so callers always receive a usable image.

mod client;
mod error;
mod placeholder;
mod retry;
mod types;

pub use client::{IllustrationClient, IllustratorConfig, ProxyTransport};
pub use error::IllustrationError;
pub use placeholder::placeholder_image;
pub use types::{IllustrationRequest, ImageHandle, ImagePayload, Prediction, UpstreamImageResponse};

#[cfg(test)]
pub(crate) use retry::tests::RecordingSleeper;

use async_trait::async_trait;
use std::sync::Arc;

/// One attempt at turning a prompt into an image
#[async_trait]
pub trait ImageTransport: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<ImagePayload, IllustrationError>;

    /// Human-readable target, for logs
    fn endpoint(&self) -> &str;
}

/// Logging wrapper for image transports
pub struct LoggingTransport {
    inner: Arc<dyn ImageTransport>,
    endpoint: String,
}

impl LoggingTransport {
    pub fn new(inner: Arc<dyn ImageTransport>) -> Self {
        let endpoint = inner.endpoint().to_string();
        Self { inner, endpoint }
    }
}

#[async_trait]
impl ImageTransport for LoggingTransport {
    async fn generate(&self, prompt: &str) -> Result<ImagePayload, IllustrationError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate(prompt).await;
        let duration = start.elapsed();

        match &result {
            Ok(payload) => {
                tracing::info!(
                    endpoint = %self.endpoint,
                    duration_ms = %duration.as_millis(),
                    mime_type = %payload.mime_type,
                    bytes = payload.base64.len(),
                    "Illustration request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.endpoint,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "Illustration request failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

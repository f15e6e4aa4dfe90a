//! Proxy-backed transport and the retrying, never-failing client

use super::placeholder_image;
use super::retry::{retry_with_backoff, RetryError, RetryPolicy, Sleeper, TokioSleeper};
use super::types::{IllustrationRequest, ImageHandle, ImagePayload, UpstreamImageResponse};
use super::{IllustrationError, ImageTransport};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const ERROR_BODY_LIMIT: usize = 500;

/// Configuration for the illustration client
#[derive(Debug, Clone, PartialEq)]
pub struct IllustratorConfig {
    pub proxy_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl IllustratorConfig {
    /// Read `TEACHER_BOT_PROXY_URL`, `TEACHER_BOT_IMAGE_TIMEOUT_SECS`,
    /// `TEACHER_BOT_RETRY_MAX_ATTEMPTS` and `TEACHER_BOT_RETRY_BASE_MS`
    pub fn from_env(default_proxy_url: String) -> Self {
        let defaults = RetryPolicy::default();
        let max_attempts =
            env_parse("TEACHER_BOT_RETRY_MAX_ATTEMPTS").unwrap_or(defaults.max_attempts);
        let base_delay = env_parse("TEACHER_BOT_RETRY_BASE_MS")
            .map_or(defaults.base_delay, Duration::from_millis);
        let timeout =
            Duration::from_secs(env_parse("TEACHER_BOT_IMAGE_TIMEOUT_SECS").unwrap_or(60));

        Self {
            proxy_url: std::env::var("TEACHER_BOT_PROXY_URL").unwrap_or(default_proxy_url),
            timeout,
            retry: RetryPolicy {
                max_attempts,
                base_delay,
                multiplier: defaults.multiplier,
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[derive(Serialize)]
struct ProxyRequest<'a> {
    prompt: &'a str,
}

/// Talks to the image proxy over HTTP
pub struct ProxyTransport {
    client: Client,
    url: String,
}

impl ProxyTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ImageTransport for ProxyTransport {
    async fn generate(&self, prompt: &str) -> Result<ImagePayload, IllustrationError> {
        let response = self
            .client
            .post(&self.url)
            .json(&ProxyRequest { prompt })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IllustrationError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    IllustrationError::network(format!("Connection failed: {e}"))
                } else {
                    IllustrationError::network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IllustrationError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(IllustrationError::from_status(status.as_u16(), &snippet));
        }

        UpstreamImageResponse::parse(&body)?.first_payload()
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// Fetches illustrations, retrying transient failures and substituting a
/// placeholder when the provider cannot deliver
pub struct IllustrationClient {
    transport: Arc<dyn ImageTransport>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl IllustrationClient {
    pub fn new(transport: Arc<dyn ImageTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    #[cfg(test)]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Always resolves to a renderable image
    pub async fn fetch_illustration(&self, request: &IllustrationRequest) -> ImageHandle {
        let transport = &self.transport;
        let prompt = request.prompt.as_str();
        let result = retry_with_backoff(&self.policy, self.sleeper.as_ref(), |_attempt| {
            transport.generate(prompt)
        })
        .await;

        match result {
            Ok(payload) => ImageHandle::generated(&payload),
            Err(e) => {
                match &e {
                    RetryError::Terminal(cause) => tracing::warn!(
                        question_id = request.question_id,
                        kind = ?cause.kind,
                        error = %cause,
                        "Illustration failed terminally, using placeholder"
                    ),
                    RetryError::Exhausted { attempts, last } => tracing::warn!(
                        question_id = request.question_id,
                        attempts,
                        error = %last,
                        "Illustration retries exhausted, using placeholder"
                    ),
                }
                placeholder_image(request.question_id, &request.prompt)
            }
        }
    }
}

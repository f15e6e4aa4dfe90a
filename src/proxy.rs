//! Image generation proxy
//!
//! Holds the provider credential server-side and forwards prompts to the
//! configured upstream, returning images in the `predictions` shape the
//! illustration client reads.

mod upstream;

pub use upstream::UpstreamKind;

use crate::illustration::{Prediction, UpstreamImageResponse};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Prompt that reports credential presence instead of generating
pub const STATUS_CHECK_PROMPT: &str = "__status_check__";

const BODY_SNIPPET_LIMIT: usize = 2000;
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(50);

/// Proxy settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub generative_key: Option<String>,
    pub vite_key: Option<String>,
    pub upstream: UpstreamKind,
    pub upstream_url: String,
}

impl ProxyConfig {
    /// Read `GENERATIVE_API_KEY`, `VITE_IMG_API_KEY`, `TEACHER_BOT_UPSTREAM`
    /// and `TEACHER_BOT_UPSTREAM_URL`
    pub fn from_env() -> Result<Self, String> {
        let upstream = match std::env::var("TEACHER_BOT_UPSTREAM") {
            Ok(value) if !value.trim().is_empty() => value.parse()?,
            _ => UpstreamKind::default(),
        };
        let upstream_url = non_empty_env("TEACHER_BOT_UPSTREAM_URL")
            .unwrap_or_else(|| upstream.default_url().to_string());

        Ok(Self {
            generative_key: non_empty_env("GENERATIVE_API_KEY"),
            vite_key: non_empty_env("VITE_IMG_API_KEY"),
            upstream,
            upstream_url,
        })
    }

    /// Server-side key, preferring `GENERATIVE_API_KEY`
    pub fn api_key(&self) -> Option<&str> {
        self.generative_key.as_deref().or(self.vite_key.as_deref())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    prompt: Option<String>,
}

/// Credential presence, never the values
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub ok: bool,
    pub has_generative_key: bool,
    pub has_vite_key: bool,
}

/// Successful proxy responses
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ProxyReply {
    Status(StatusReport),
    Images { predictions: Vec<Prediction> },
}

/// Errors returned to proxy callers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProxyError {
    #[error("Missing prompt")]
    MissingPrompt,
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("No API key configured on server")]
    NoApiKey,
    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(String),
    #[error("Upstream API error: {status}")]
    Upstream {
        status: u16,
        body_snippet: String,
        content_type: Option<String>,
        content_length: Option<String>,
    },
    #[error("{0}")]
    Malformed(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::MissingPrompt => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            ProxyError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, "POST")],
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            ProxyError::NoApiKey | ProxyError::Malformed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            ProxyError::UpstreamFetch(message) => (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "Upstream fetch failed", "message": message })),
            )
                .into_response(),
            ProxyError::Upstream {
                status,
                body_snippet,
                content_type,
                content_length,
            } => (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": "Upstream API error",
                    "status": status,
                    "bodySnippet": body_snippet,
                    "headers": {
                        "content-type": content_type,
                        "content-length": content_length,
                    },
                })),
            )
                .into_response(),
        }
    }
}

/// Forwards prompts to the configured upstream
pub struct ImageProxy {
    config: ProxyConfig,
    client: Client,
}

impl ImageProxy {
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(UPSTREAM_TIMEOUT).build()?;
        Ok(Self { config, client })
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            ok: true,
            has_generative_key: self.config.generative_key.is_some(),
            has_vite_key: self.config.vite_key.is_some(),
        }
    }

    /// Handle a raw request body
    pub async fn handle(&self, body: &[u8]) -> Result<ProxyReply, ProxyError> {
        let prompt = serde_json::from_slice::<GenerateRequest>(body)
            .ok()
            .and_then(|r| r.prompt)
            .filter(|p| !p.is_empty())
            .ok_or(ProxyError::MissingPrompt)?;

        if prompt == STATUS_CHECK_PROMPT {
            return Ok(ProxyReply::Status(self.status()));
        }

        let predictions = self.generate(&prompt).await?;
        Ok(ProxyReply::Images { predictions })
    }

    async fn generate(&self, prompt: &str) -> Result<Vec<Prediction>, ProxyError> {
        let api_key = self.config.api_key().ok_or(ProxyError::NoApiKey)?;
        let upstream = self.config.upstream;
        let start = std::time::Instant::now();

        let response = upstream
            .build_request(&self.client, &self.config.upstream_url, api_key, prompt)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(upstream = upstream.name(), error = %e, "Upstream fetch failed");
                ProxyError::UpstreamFetch(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let header_value = |name: header::HeaderName| {
                response
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            let content_type = header_value(header::CONTENT_TYPE);
            let content_length = header_value(header::CONTENT_LENGTH);
            let body_snippet = match response.text().await {
                Ok(text) => text.chars().take(BODY_SNIPPET_LIMIT).collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read upstream error body");
                    String::new()
                }
            };
            tracing::error!(
                upstream = upstream.name(),
                status = status.as_u16(),
                body_snippet = %body_snippet,
                "Upstream API error"
            );
            return Err(ProxyError::Upstream {
                status: status.as_u16(),
                body_snippet,
                content_type,
                content_length,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProxyError::UpstreamFetch(e.to_string()))?;
        let predictions = UpstreamImageResponse::parse(&body)
            .map_err(|e| {
                tracing::error!(
                    upstream = upstream.name(),
                    error = %e,
                    "Upstream response unreadable"
                );
                ProxyError::Malformed(e.to_string())
            })?
            .into_predictions();

        tracing::info!(
            upstream = upstream.name(),
            images = predictions.len(),
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Upstream image generated"
        );
        Ok(predictions)
    }
}

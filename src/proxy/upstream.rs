//! Upstream image provider contracts
//!
//! Each deployment talks to exactly one provider. Both shapes are
//! normalized to `{ predictions: [{ bytesBase64Encoded }] }` before they
//! reach the client.

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::str::FromStr;

pub const STABILITY_URL: &str =
    "https://api.stability.ai/v1/generation/stable-diffusion-v1-6/text-to-image";
pub const IMAGEN_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/imagen-3.0-generate-002:predict";

/// Which provider contract the proxy speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpstreamKind {
    #[default]
    Stability,
    Imagen,
}

impl UpstreamKind {
    pub fn default_url(self) -> &'static str {
        match self {
            UpstreamKind::Stability => STABILITY_URL,
            UpstreamKind::Imagen => IMAGEN_URL,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UpstreamKind::Stability => "stability",
            UpstreamKind::Imagen => "imagen",
        }
    }

    /// Build the provider request for `prompt`
    pub fn build_request(
        self,
        client: &Client,
        url: &str,
        api_key: &str,
        prompt: &str,
    ) -> RequestBuilder {
        match self {
            UpstreamKind::Stability => client
                .post(url)
                .bearer_auth(api_key)
                .header(reqwest::header::ACCEPT, "application/json")
                .json(&StabilityRequest::new(prompt)),
            UpstreamKind::Imagen => client
                .post(url)
                .query(&[("key", api_key)])
                .json(&ImagenRequest::new(prompt)),
        }
    }
}

impl FromStr for UpstreamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stability" => Ok(UpstreamKind::Stability),
            "imagen" => Ok(UpstreamKind::Imagen),
            other => Err(format!("unknown upstream '{other}', expected stability or imagen")),
        }
    }
}

// ============================================================================
// Stability text-to-image
// ============================================================================

#[derive(Debug, Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct StabilityRequest<'a> {
    text_prompts: [TextPrompt<'a>; 1],
    cfg_scale: u32,
    height: u32,
    width: u32,
    samples: u32,
    steps: u32,
}

impl<'a> StabilityRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            text_prompts: [TextPrompt { text: prompt }],
            cfg_scale: 7,
            height: 512,
            width: 768,
            samples: 1,
            steps: 30,
        }
    }
}

// ============================================================================
// Imagen predict
// ============================================================================

#[derive(Debug, Serialize)]
struct ImagenInstance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenParameters {
    sample_count: u32,
}

#[derive(Debug, Serialize)]
struct ImagenRequest<'a> {
    instances: [ImagenInstance<'a>; 1],
    parameters: ImagenParameters,
}

impl<'a> ImagenRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            instances: [ImagenInstance { prompt }],
            parameters: ImagenParameters { sample_count: 1 },
        }
    }
}

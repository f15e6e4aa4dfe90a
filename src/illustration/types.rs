//! Image handle and upstream payload types

use super::IllustrationError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

const DEFAULT_MIME_TYPE: &str = "image/png";

/// Where an image handle came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrigin {
    Generated,
    Placeholder,
}

/// A displayable image, always a `data:` URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHandle {
    pub uri: String,
    pub origin: ImageOrigin,
}

impl ImageHandle {
    pub fn generated(payload: &ImagePayload) -> Self {
        Self {
            uri: payload.to_data_uri(),
            origin: ImageOrigin::Generated,
        }
    }

    pub fn placeholder(uri: String) -> Self {
        Self {
            uri,
            origin: ImageOrigin::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.origin == ImageOrigin::Placeholder
    }
}

/// What the state machine asks the illustrator for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllustrationRequest {
    pub question_id: u32,
    pub prompt: String,
}

/// A decoded, validated image body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub base64: String,
}

impl ImagePayload {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// Imagen-style prediction; also the normalized shape the proxy returns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub bytes_base64_encoded: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Stability-style artifact
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub base64: String,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Every response shape observed from image providers and the proxy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UpstreamImageResponse {
    Predictions { predictions: Vec<Prediction> },
    Artifacts { artifacts: Vec<Artifact> },
    Single(Prediction),
}

impl UpstreamImageResponse {
    pub fn parse(body: &str) -> Result<Self, IllustrationError> {
        serde_json::from_str(body)
            .map_err(|e| IllustrationError::malformed(format!("Unexpected response shape: {e}")))
    }

    /// Normalize into predictions, whatever the schema
    pub fn into_predictions(self) -> Vec<Prediction> {
        match self {
            Self::Predictions { predictions } => predictions,
            Self::Artifacts { artifacts } => artifacts
                .into_iter()
                .map(|a| Prediction {
                    bytes_base64_encoded: a.base64,
                    mime_type: None,
                })
                .collect(),
            Self::Single(prediction) => vec![prediction],
        }
    }

    /// The first image, validated as non-empty base64
    pub fn first_payload(self) -> Result<ImagePayload, IllustrationError> {
        let prediction = self
            .into_predictions()
            .into_iter()
            .next()
            .ok_or_else(|| IllustrationError::malformed("Response contained no images"))?;

        if prediction.bytes_base64_encoded.is_empty() {
            return Err(IllustrationError::malformed("Image payload is empty"));
        }
        STANDARD
            .decode(prediction.bytes_base64_encoded.as_bytes())
            .map_err(|e| {
                IllustrationError::malformed(format!("Image payload is not base64: {e}"))
            })?;

        Ok(ImagePayload {
            mime_type: prediction
                .mime_type
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            base64: prediction.bytes_base64_encoded,
        })
    }
}

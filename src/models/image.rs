use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate-image`.
///
/// `prompt` is optional at the type level so that a missing field can be
/// reported as a validation error rather than a deserialization failure.
/// Only strings are accepted: `{"prompt": null}` counts as missing, and a
/// non-string value such as `{"prompt": 5}` fails to parse. Both are rejected
/// with a 400 instead of being forwarded to the model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    pub image_url: String, // data:image/jpeg;base64,...
    pub prompt: String,
}

/// Payload sent to the inference endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct InferencePayload {
    pub inputs: String,
}

impl InferencePayload {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            inputs: prompt.into(),
        }
    }
}

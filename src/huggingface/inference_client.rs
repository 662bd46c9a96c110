use crate::{
    config::HuggingFaceConfig,
    error::{RelayError, Result},
    huggingface::ImageBackend,
    models::{InferencePayload, UpstreamResponse},
};
use async_trait::async_trait;
use reqwest::Client;

/// reqwest-backed client for the HuggingFace Inference API.
#[derive(Clone)]
pub struct InferenceClient {
    client: Client,
    api_url: String,
    api_token: String,
}

impl InferenceClient {
    pub fn new(config: &HuggingFaceConfig) -> Result<Self> {
        let api_token = config.api_token.clone().ok_or(RelayError::ConfigError)?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RelayError::InternalError(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_token,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn build_headers(&self) -> Result<reqwest::header::HeaderMap> {
        let mut headers = reqwest::header::HeaderMap::new();
        let bearer = format!("Bearer {}", self.api_token)
            .parse()
            .map_err(|_| RelayError::InternalError("API token is not a valid header value".into()))?;
        headers.insert(reqwest::header::AUTHORIZATION, bearer);
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }
}

#[async_trait]
impl ImageBackend for InferenceClient {
    async fn infer(&self, payload: &InferencePayload) -> Result<UpstreamResponse> {
        log::debug!("POST {}", self.api_url);

        let response = self
            .client
            .post(&self.api_url)
            .headers(self.build_headers()?)
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        log::debug!("Inference API responded {} with {} bytes", status, body.len());

        Ok(UpstreamResponse::new(status, body.to_vec()))
    }
}

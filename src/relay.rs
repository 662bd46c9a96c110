use crate::{
    config::Config,
    error::{RelayError, Result},
    huggingface::{ImageBackend, InferenceClient, RetryPolicy},
    logger,
    models::{GenerateImageRequest, GenerateImageResponse, HealthResponse, InferencePayload},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

pub const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Turns prompts into data-URI images by way of an inference backend.
///
/// Without a configured credential there is no backend; the service still
/// answers health checks but every generation fails with a config error.
#[derive(Clone)]
pub struct RelayService {
    backend: Option<Arc<dyn ImageBackend>>,
    retry: RetryPolicy,
}

impl RelayService {
    pub fn new(backend: Option<Arc<dyn ImageBackend>>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let backend: Option<Arc<dyn ImageBackend>> = if config.huggingface.token_configured() {
            Some(Arc::new(InferenceClient::new(&config.huggingface)?))
        } else {
            None
        };

        Ok(Self::new(backend, config.retry.clone()))
    }

    pub fn token_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub fn health_check(&self) -> HealthResponse {
        HealthResponse::ok(self.token_configured())
    }

    pub async fn generate_image(
        &self,
        request: GenerateImageRequest,
    ) -> Result<GenerateImageResponse> {
        let prompt = request.prompt.ok_or(RelayError::ValidationError)?;
        let backend = self.backend.as_deref().ok_or(RelayError::ConfigError)?;

        log::info!("🎨 Generating image for prompt: {}", prompt);

        let payload = InferencePayload::new(prompt.clone());
        let response = {
            let _timer = logger::timer("inference request");
            let payload = &payload;
            self.retry.run(move |_| backend.infer(payload)).await?
        };

        if !response.is_success() {
            return Err(RelayError::UpstreamError(response.text()));
        }

        log::info!("✅ Received {} bytes of image data", response.body.len());

        Ok(GenerateImageResponse {
            image_url: to_data_uri(&response.body),
            prompt,
        })
    }
}

pub fn to_data_uri(image: &[u8]) -> String {
    format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(image))
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Prompt is required")]
    ValidationError,
    #[error("API token not configured. Please set HUGGINGFACE_API_KEY in your .env file")]
    ConfigError,
    #[error("API Error: {0}")]
    UpstreamError(String),
    #[error("Failed to connect to image API: {0}")]
    NetworkError(String),
    #[error("An unexpected error occurred: {0}")]
    InternalError(String),
}

impl RelayError {
    /// HTTP status code this error is surfaced with.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::ValidationError => 400,
            _ => 500,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::ValidationError => "validation",
            RelayError::ConfigError => "config",
            RelayError::UpstreamError(_) => "upstream",
            RelayError::NetworkError(_) => "network",
            RelayError::InternalError(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::NetworkError(e.to_string())
    }
}

#[cfg(feature = "server")]
impl actix_web::ResponseError for RelayError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::from_u16(RelayError::status_code(self))
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        match self {
            RelayError::ValidationError => log::warn!("Rejected request: {}", self),
            _ => log::error!("Request failed ({}): {}", self.kind(), self),
        }

        actix_web::HttpResponse::build(actix_web::ResponseError::status_code(self))
            .json(crate::models::ErrorBody::new(self.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

use crate::huggingface::RetryPolicy;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-2";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Environment variables the credential is read from, in order of preference.
pub const TOKEN_VARS: [&str; 2] = ["HUGGINGFACE_API_KEY", "HF_API_TOKEN"];

#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub api_token: Option<String>,
    pub api_url: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    pub huggingface: HuggingFaceConfig,
    pub retry: RetryPolicy,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        HuggingFaceConfig {
            api_token: None,
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl HuggingFaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = resolve_token(&lookup);
        let api_url = lookup("HF_API_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let request_timeout = lookup("HF_REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));

        HuggingFaceConfig {
            api_token,
            api_url,
            request_timeout,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = normalize_token(token.into());
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn token_configured(&self) -> bool {
        self.api_token.is_some()
    }
}

fn normalize_token(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn resolve_token<F>(lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    for (i, key) in TOKEN_VARS.iter().copied().enumerate() {
        if let Some(token) = lookup(key).and_then(normalize_token) {
            return Some(token);
        }
        if i + 1 < TOKEN_VARS.len() {
            log::warn!("{} not found in environment variables", key);
        } else {
            log::warn!(
                "{} also not found. Please set one of these environment variables.",
                key
            );
        }
    }
    None
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            huggingface: HuggingFaceConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = lookup("PORT")
            .and_then(|port| port.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let cors_origin = lookup("CORS_ORIGIN")
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
        let max_body_bytes = lookup("MAX_BODY_BYTES")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|bytes| *bytes > 0)
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        Config {
            host,
            port,
            cors_origin,
            max_body_bytes,
            huggingface: HuggingFaceConfig::from_lookup(&lookup),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origin = origin.into();
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn with_huggingface(mut self, config: HuggingFaceConfig) -> Self {
        self.huggingface = config;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

//! HTTP relay that turns text prompts into browser-ready images using the
//! HuggingFace Inference API.
//!
//! The relay forwards `{ "inputs": prompt }` to the configured model, waits
//! out a cold start once if the model is still loading, and returns the image
//! as a `data:image/jpeg;base64,...` URI.

pub mod config;
pub mod error;
pub mod huggingface;
pub mod logger;
pub mod models;
pub mod relay;
#[cfg(feature = "server")]
pub mod server;

pub use config::{Config, HuggingFaceConfig};
pub use error::{RelayError, Result};
pub use huggingface::{ImageBackend, InferenceClient, RetryPolicy};
pub use models::*;
pub use relay::RelayService;

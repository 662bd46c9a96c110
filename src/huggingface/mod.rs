pub mod inference_client;
pub mod retry;

use crate::{
    error::Result,
    models::{InferencePayload, UpstreamResponse},
};
use async_trait::async_trait;

pub use inference_client::InferenceClient;
pub use retry::RetryPolicy;

/// Something that can run one text-to-image inference call.
///
/// A call only fails for transport problems; any HTTP status the endpoint
/// answers with comes back as an `UpstreamResponse`.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn infer(&self, payload: &InferencePayload) -> Result<UpstreamResponse>;
}

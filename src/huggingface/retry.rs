use crate::{error::Result, models::UpstreamResponse};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Bounded retry for cold-starting models.
///
/// Only a "model loading" reply (503) is retried. The wait before the next
/// attempt is taken from the `estimated_time` hint in the reply body.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Used when the body parses but carries no `estimated_time`.
    pub default_hint: Duration,
    /// Upper bound for any hinted wait.
    pub max_wait: Duration,
    /// Used when the body cannot be interpreted at all.
    pub fallback_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            default_hint: Duration::from_secs(20),
            max_wait: Duration::from_secs(20),
            fallback_wait: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_fallback_wait(mut self, fallback_wait: Duration) -> Self {
        self.fallback_wait = fallback_wait;
        self
    }

    pub fn should_retry(&self, attempt: u32, response: &UpstreamResponse) -> bool {
        response.is_loading() && attempt < self.max_attempts
    }

    /// How long to wait after a loading reply before calling again.
    pub fn wait_for(&self, response: &UpstreamResponse) -> Duration {
        let body = match serde_json::from_slice::<Value>(&response.body) {
            Ok(Value::Object(body)) => body,
            _ => return self.fallback_wait,
        };

        match body.get("estimated_time") {
            None => self.default_hint.min(self.max_wait),
            Some(hint) => match hint.as_f64() {
                Some(secs) if secs.is_finite() && secs >= 0.0 => {
                    Duration::try_from_secs_f64(secs.min(self.max_wait.as_secs_f64()))
                        .unwrap_or(self.max_wait)
                }
                _ => self.fallback_wait,
            },
        }
    }

    /// Runs `call` until it returns a non-retryable reply or attempts run out.
    /// The last reply is returned as-is; transport errors end the loop.
    pub async fn run<F, Fut>(&self, mut call: F) -> Result<UpstreamResponse>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<UpstreamResponse>>,
    {
        let mut attempt = 1;
        loop {
            let response = call(attempt).await?;
            log::info!(
                "Inference attempt {}/{} returned status {}",
                attempt,
                self.max_attempts,
                response.status
            );

            if !self.should_retry(attempt, &response) {
                return Ok(response);
            }

            let wait = self.wait_for(&response);
            log::info!(
                "⏳ Model is loading, retrying in {:.1}s",
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}

//! Retry with exponential backoff for the HTTP-backed tools.
//!
//! The delay before retry `n` (0-based) is `unit * 2^(n + 2)`; with the
//! default one-second unit that is 4s, 8s, 16s, 32s between five attempts.

use std::time::Duration;

use paperscout_config::RetryConfig;
use tracing::{debug, warn};

/// How often and how patiently a request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    unit: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            unit,
        }
    }

    /// Total number of attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after failed attempt `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(2u32.saturating_pow(attempt + 2))
    }

    /// Every delay the policy will sleep through when all attempts fail.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts - 1).map(|n| self.delay(n)).collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.backoff_unit())
    }
}

/// The last failure seen once every attempt is used up.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("{status} {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Transport(String),
}

/// Send the request built by `build` until it returns a 2xx response.
///
/// Non-2xx responses and transport errors are both retried. The returned
/// error describes the final attempt.
pub async fn send_with_retry<F>(
    policy: &RetryPolicy,
    mut build: F,
) -> Result<reqwest::Response, FetchError>
where
    F: FnMut() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        let failure = match build().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                FetchError::Status { status, body }
            }
            Err(e) => FetchError::Transport(e.to_string()),
        };

        if attempt + 1 >= policy.max_attempts {
            warn!(attempts = attempt + 1, error = %failure, "All retry attempts failed");
            return Err(failure);
        }

        let delay = policy.delay(attempt);
        debug!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, error = %failure, "Request failed, backing off");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

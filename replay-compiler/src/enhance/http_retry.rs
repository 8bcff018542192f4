//! HTTP retry with exponential backoff for enhancement providers.
//!
//! Rate limiting (429) backs off twice as long as server errors and
//! connection failures. Any other 4xx is returned immediately.

use super::EnhanceError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::warn;

/// Attempt count and base delay for [`send_with_retry`]
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Delay before retrying after `attempt` (0-based) failed
    pub fn delay_for(&self, attempt: u32, rate_limited: bool) -> Duration {
        let exponent = if rate_limited { attempt + 1 } else { attempt };
        self.base_delay * 2u32.saturating_pow(exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Send a request, rebuilding it for every attempt.
///
/// - 429: backoff 2, 4, 8 x base
/// - 5xx, timeout, connect: backoff 1, 2, 4 x base
/// - other 4xx: `EnhanceError::Status` without retrying
pub async fn send_with_retry<F>(
    client: &Client,
    build_request: F,
    policy: RetryPolicy,
    provider: &str,
) -> Result<Response, EnhanceError>
where
    F: Fn(&Client) -> RequestBuilder,
{
    for attempt in 0..policy.max_retries {
        let delay = match build_request(client).send().await {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    return Ok(resp);
                }
                if status == StatusCode::TOO_MANY_REQUESTS {
                    let delay = policy.delay_for(attempt, true);
                    warn!(provider, ?delay, "Rate limited");
                    delay
                } else if status.is_server_error() {
                    let delay = policy.delay_for(attempt, false);
                    warn!(provider, %status, ?delay, "Server error");
                    delay
                } else {
                    warn!(provider, %status, "Non-retriable response");
                    return Err(EnhanceError::Status {
                        provider: provider.to_string(),
                        status: status.as_u16(),
                    });
                }
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                let delay = policy.delay_for(attempt, false);
                warn!(provider, error = %e, ?delay, "Network error");
                delay
            }
            Err(e) => {
                warn!(provider, error = %e, "Request failed");
                return Err(EnhanceError::Network(e.to_string()));
            }
        };

        // No backoff after the last attempt
        if attempt + 1 < policy.max_retries {
            tokio::time::sleep(delay).await;
        }
    }

    warn!(provider, attempts = policy.max_retries, "Retries exhausted");
    Err(EnhanceError::RetriesExhausted {
        provider: provider.to_string(),
        attempts: policy.max_retries,
    })
}

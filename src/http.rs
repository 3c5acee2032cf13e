// ABOUTME: HTTP plumbing shared by the text and image service clients
// ABOUTME: Builds bounded blocking clients and sends requests with retry and backoff

use crate::errors::{Result, SlidesError};
use crate::pacing::CancelToken;
use log::{info, warn};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use std::time::Duration;

const INITIAL_RETRY_DELAY_MS: u64 = 1000;

/// Create a blocking client whose requests time out after `timeout`.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("auto-slides/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(SlidesError::FetchError)
}

/// Retry policy for a service client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(INITIAL_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Send a request, retrying transport failures, 5xx and 429 responses with
/// exponential backoff. Other non-success statuses fail immediately.
pub fn send_with_retry<F>(
    label: &str,
    policy: RetryPolicy,
    cancel: &CancelToken,
    mut send: F,
) -> Result<Response>
where
    F: FnMut() -> reqwest::Result<Response>,
{
    let mut retry_delay = policy.initial_delay;
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts.max(1) {
        cancel.check()?;

        match send() {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                let error = SlidesError::HttpStatus {
                    status: status.as_u16(),
                    url: label.to_string(),
                };
                if !is_retryable(status) {
                    return Err(error);
                }
                last_error = Some(error);
            }
            Err(e) => {
                last_error = Some(SlidesError::FetchError(e));
            }
        }

        if attempt < policy.max_attempts {
            info!(
                "{} attempt {} failed, retrying in {} ms",
                label,
                attempt,
                retry_delay.as_millis()
            );
            cancel.sleep(retry_delay)?;
            retry_delay *= 2;
        }
    }

    let error = last_error.unwrap_or_else(|| {
        SlidesError::UpstreamError(format!("Unknown error calling {}", label))
    });
    warn!("{} failed after {} attempts: {}", label, policy.max_attempts, error);
    Err(error)
}

//! Shared HTTP transport for provider clients.
//!
//! DESIGN
//! ======
//! Both providers speak JSON over HTTPS, so the send / status check /
//! classification path lives here. The only retry at this layer is the
//! bounded exponential backoff for rate-limit responses; switching model
//! variants is the fallback chain's job.

use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use tracing::warn;

use super::config::{LlmTimeouts, RetryPolicy};
use super::types::{FailureKind, FailureRecord, LlmError, preview};

/// Upper bound on provider body text carried in a failure detail.
const MAX_DETAIL_CHARS: usize = 500;

/// A successful (2xx) provider reply.
#[derive(Debug)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Build a `reqwest` client with the provider's timeouts.
///
/// # Errors
///
/// Returns [`LlmError::HttpClientBuild`] if the TLS backend fails to load.
pub fn build_client(timeouts: LlmTimeouts) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeouts.request_secs))
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .build()
        .map_err(|e| LlmError::HttpClientBuild(e.to_string()))
}

/// Send a request built by `build`, retrying rate-limit responses.
///
/// `build` is called once per attempt. Non-2xx replies are classified with
/// `classify`; rate-limited replies are retried with exponential backoff
/// until `retry.max_attempts` calls have been made.
///
/// # Errors
///
/// Returns a classified [`FailureRecord`] for network errors, timeouts and
/// non-2xx statuses.
pub async fn send_with_backoff<B, C>(build: B, retry: RetryPolicy, classify: C) -> Result<HttpReply, FailureRecord>
where
    B: Fn() -> reqwest::RequestBuilder,
    C: Fn(Option<u16>, &str) -> FailureKind,
{
    let mut attempt: u32 = 1;
    loop {
        let response = build()
            .send()
            .await
            .map_err(|e| transport_failure(&e))?;

        let status = response.status().as_u16();
        let retry_after_ms = retry_after_ms(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| transport_failure(&e))?;

        if response_ok(status) {
            return Ok(HttpReply { status, body });
        }

        let kind = classify(Some(status), &body);
        if kind == FailureKind::RateLimited && attempt < retry.max_attempts {
            let delay = backoff_delay(retry, attempt, retry_after_ms);
            warn!(status, attempt, delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), "llm: rate limited, backing off");
            tokio::time::sleep(delay).await;
            attempt += 1;
            continue;
        }

        return Err(FailureRecord::new(kind, preview(&body, MAX_DETAIL_CHARS)).with_status(status));
    }
}

fn response_ok(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Network-level failures (timeout, refused connection, broken body) never
/// carry a status and are always transport errors.
fn transport_failure(err: &reqwest::Error) -> FailureRecord {
    let detail = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("could not connect: {err}")
    } else {
        err.to_string()
    };
    FailureRecord::new(FailureKind::TransportError, detail)
}

/// Delay before the next attempt. A server-provided `Retry-After` wins when
/// it fits under the policy cap; otherwise exponential backoff plus up to
/// 25% jitter.
fn backoff_delay(retry: RetryPolicy, attempt: u32, retry_after_ms: Option<u64>) -> Duration {
    if let Some(ms) = retry_after_ms.filter(|ms| *ms <= retry.max_backoff_ms) {
        return Duration::from_millis(ms);
    }
    let base = retry.backoff_ms(attempt);
    let jitter = if base >= 4 { rand::rng().random_range(0..=base / 4) } else { 0 };
    Duration::from_millis(base + jitter)
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored.
fn retry_after_ms(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000))
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

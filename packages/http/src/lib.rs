#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP retry helpers for the external lookups (geocoding, street
//! network).
//!
//! Callers use [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so every outbound request
//! gets a bounded number of retries with exponential backoff on transient
//! failures (timeouts, connection resets, HTTP 429, HTTP 5xx).
//!
//! ```ignore
//! let policy = RetryPolicy::default();
//! let body = crime_route_http::send_json(&policy, || client.get(&url).query(&params)).await?;
//! ```

use std::time::Duration;

use thiserror::Error;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Errors from HTTP helpers.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Transport-level failure (connect, timeout, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status}")]
    Status {
        /// Status code returned by the server.
        status: reqwest::StatusCode,
    },

    /// The body arrived but could not be decoded.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },
}

impl HttpError {
    /// Returns `true` for rate limiting (HTTP 429).
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status } if *status == reqwest::StatusCode::TOO_MANY_REQUESTS)
    }

    /// Returns `true` if the request timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// Retry budget for a class of requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each following retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// How a response status should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx / 3xx.
    Success,
    /// 429 or 5xx: worth another attempt.
    Retryable,
    /// Any other 4xx: the request itself is wrong.
    Permanent,
}

/// Classifies an HTTP status for retry purposes.
#[must_use]
pub fn classify_status(status: reqwest::StatusCode) -> StatusClass {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        StatusClass::Retryable
    } else if status.is_client_error() {
        StatusClass::Permanent
    } else {
        StatusClass::Success
    }
}

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
///
/// # Errors
///
/// Returns [`HttpError`] if the request fails after all retries, the
/// server returns a non-retryable status code, or the body is not JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(policy: &RetryPolicy, build_request: F) -> Result<serde_json::Value, HttpError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(policy, &build_request).await?;
    let url = response.url().to_string();
    let status = response.status();
    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| {
        let preview = if text.len() > BODY_PREVIEW_LEN {
            format!("{}...", truncate_to_char_boundary(&text, BODY_PREVIEW_LEN))
        } else {
            text.clone()
        };
        log::error!(
            "JSON parse failed.\n  \
             url: {url}\n  \
             status: {status}\n  \
             received: {} bytes\n  \
             parse error: {e}\n  \
             body preview: {preview}",
            text.len(),
        );
        HttpError::Decode {
            message: format!("JSON parse failed: {e} (status={status}, received {} bytes)", text.len()),
        }
    })
}

/// Retry loop behind [`send_json`].
#[allow(clippy::future_not_send)]
async fn send_inner<F>(policy: &RetryPolicy, build_request: &F) -> Result<reqwest::Response, HttpError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let max_retries = policy.max_retries;
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    attempt += 1;
                    continue;
                }
                return Err(HttpError::Http(e));
            }
            Ok(response) => {
                let status = response.status();
                match classify_status(status) {
                    StatusClass::Success => return Ok(response),
                    StatusClass::Retryable if attempt < max_retries => {
                        log::warn!("  HTTP {status} from {}", response.url());
                        attempt += 1;
                    }
                    StatusClass::Retryable | StatusClass::Permanent => {
                        return Err(HttpError::Status { status });
                    }
                }
            }
        }
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}

fn truncate_to_char_boundary(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_for(0), Duration::ZERO);
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn backoff_saturates() {
        let policy = RetryPolicy {
            max_retries: 100,
            base_delay: Duration::from_secs(1),
        };
        assert!(policy.delay_for(64) >= Duration::from_secs(u64::from(u32::MAX)));
    }

    #[test]
    fn classifies_statuses() {
        use reqwest::StatusCode;
        assert_eq!(classify_status(StatusCode::OK), StatusClass::Success);
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            StatusClass::Retryable
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY),
            StatusClass::Retryable
        );
        assert_eq!(classify_status(StatusCode::NOT_FOUND), StatusClass::Permanent);
    }

    #[test]
    fn rate_limit_detection() {
        let err = HttpError::Status {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
        };
        assert!(err.is_rate_limited());
        assert!(!err.is_timeout());
    }

    #[test]
    fn truncates_on_char_boundary() {
        let s = "ab\u{00e9}cd";
        assert_eq!(truncate_to_char_boundary(s, 3), "ab");
        assert_eq!(truncate_to_char_boundary(s, 10), s);
    }
}

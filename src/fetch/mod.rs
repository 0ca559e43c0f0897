//! HTTP page client for catalog fetching.
//!
//! The [`PageClient`] wraps a pooled `reqwest` client configured with a
//! browser-like header set and split connect/read timeouts, and retries
//! transient failures with exponential backoff. Callers get a parsed
//! document back or a typed [`FetchError`]; absence of a document is always
//! a skip-and-continue condition for the pipeline, never a panic.

mod error;
mod rate_limiter;
mod retry;

pub use error::FetchError;
pub use rate_limiter::RateLimiter;
pub use retry::{
    DEFAULT_MAX_RETRIES, FailureKind, RetryDecision, RetryPolicy, classify_fetch_error,
};

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use scraper::Html;
use tracing::{debug, instrument, warn};

/// HTTP connect timeout (10 seconds).
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP read timeout (30 seconds).
const READ_TIMEOUT_SECS: u64 = 30;

/// Browser-like User-Agent; plain library UAs get blocked outright.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// HTTP client for fetching and parsing catalog pages.
///
/// Created once and reused for the whole run, taking advantage of connection
/// pooling. Cloning is cheap (the inner client is reference-counted).
#[derive(Debug, Clone)]
pub struct PageClient {
    client: Client,
    policy: RetryPolicy,
    limiter: Arc<RateLimiter>,
}

impl PageClient {
    /// Creates a page client with the given politeness delay between
    /// requests to the same domain.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(politeness_delay: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .gzip(true)
            .cookie_store(true)
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(browser_headers())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            policy: RetryPolicy::default(),
            limiter: Arc::new(RateLimiter::new(politeness_delay)),
        }
    }

    /// Replaces the retry policy (used by tests to shrink backoff delays).
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the shared per-domain rate limiter.
    #[must_use]
    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Returns a reference to the underlying reqwest client.
    ///
    /// The image store reuses it so page and image traffic share one pool.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Fetches a URL and parses the body as an HTML document.
    ///
    /// Transient failures (timeouts, connection errors, statuses
    /// 429/500/502/503/504/522/524) are retried with exponential backoff
    /// starting at 1s, doubling per attempt, capped at 60s, for at most
    /// 3 retries. Non-retryable statuses (e.g. 404) fail immediately.
    ///
    /// # Errors
    ///
    /// Returns the last [`FetchError`] once the retry budget is exhausted or
    /// a permanent failure is hit. Callers treat any error as "skip this
    /// page and continue".
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_document(&self, url: &str) -> Result<Html, FetchError> {
        let mut attempt: u32 = 1;
        loop {
            self.limiter.acquire(url).await;
            match self.fetch_body(url).await {
                Ok(body) => return Ok(Html::parse_document(&body)),
                Err(error) => {
                    let kind = classify_fetch_error(&error);
                    match self.policy.should_retry(kind, attempt) {
                        RetryDecision::Retry {
                            delay,
                            attempt: next,
                        } => {
                            warn!(
                                error = %error,
                                attempt,
                                delay_ms = delay.as_millis(),
                                "fetch failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                            attempt = next;
                        }
                        RetryDecision::GiveUp => {
                            warn!(error = %error, attempt, "fetch failed, giving up");
                            return Err(error);
                        }
                    }
                }
            }
        }
    }

    /// Single GET attempt returning the response body as text.
    async fn fetch_body(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        debug!(status = status.as_u16(), "page fetched");
        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })
    }
}

/// Static browser-like header set sent with every request.
///
/// Reduces trivial bot blocking; no further anti-bot evasion is attempted.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("max-age=0"),
    );
    headers
}

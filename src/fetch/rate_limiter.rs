//! Per-domain politeness pacing for catalog requests.
//!
//! Catalog sites block clients that hammer them. The [`RateLimiter`] enforces
//! a minimum delay between consecutive requests to the same domain; requests
//! to different domains never wait on each other. It is shared by the page
//! fetch path and the image download workers, so the whole process observes
//! one pacing budget per site.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// Per-domain request pacer.
///
/// Designed to be wrapped in `Arc` and shared across download workers. The
/// per-domain mutex also serializes same-domain requests, which is exactly
/// the ordering the politeness delay needs.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum delay between requests to the same domain.
    delay: Duration,
    /// Whether pacing is disabled (`--delay-ms 0`).
    disabled: bool,
    /// Last-request instant per domain. The Arc lets the map shard lock be
    /// released before awaiting on the inner mutex.
    domains: DashMap<String, Arc<Mutex<Option<Instant>>>>,
}

impl RateLimiter {
    /// Creates a rate limiter with the given minimum inter-request delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            disabled: delay.is_zero(),
            domains: DashMap::new(),
        }
    }

    /// Creates a disabled rate limiter (no pacing).
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Waits until a request to `url`'s domain is allowed, then records it.
    ///
    /// The first request to a domain proceeds immediately.
    pub async fn acquire(&self, url: &str) {
        if self.disabled {
            return;
        }

        let domain = domain_of(url);
        let state = self
            .domains
            .entry(domain.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();

        let mut last_request = state.lock().await;
        if let Some(last) = *last_request {
            let next_allowed = last + self.delay;
            let now = Instant::now();
            if now < next_allowed {
                let wait = next_allowed - now;
                debug!(domain = %domain, wait_ms = wait.as_millis(), "pacing request");
                tokio::time::sleep(wait).await;
            }
        }
        *last_request = Some(Instant::now());
    }
}

/// Extracts the pacing key (host) from a URL, falling back to the raw string.
fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(std::string::ToString::to_string))
        .unwrap_or_else(|| url.to_string())
}

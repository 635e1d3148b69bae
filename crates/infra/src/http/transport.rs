//! Shared HTTP transport with rate limiting and backoff.
//!
//! All requests to the Listonic service go through [`Transport::send`]. The
//! transport bounds concurrency with a semaphore, enforces a minimum spacing
//! between request starts, and retries 429/5xx responses with exponential
//! backoff. Authentication calls bypass the rate gate (they run while the
//! gate may be saturated with stalled requests) but keep the backoff loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use listonic_domain::constants::{
    INITIAL_BACKOFF_SECS, MAX_BACKOFF_ATTEMPTS, MAX_BACKOFF_SECS, MAX_CONCURRENT_REQUESTS,
    MIN_REQUEST_INTERVAL_MS,
};
use listonic_domain::{Result, SyncError};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, warn};

/// Whether a request participates in the concurrency/spacing gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimit {
    /// Normal resource traffic: bounded concurrency plus minimum spacing.
    Enforce,
    /// Token traffic: skip the gate, keep backoff.
    Bypass,
}

/// HTTP transport shared by the session manager and the API client.
#[derive(Clone)]
pub struct Transport {
    client: ReqwestClient,
    semaphore: Arc<Semaphore>,
    last_request: Arc<Mutex<Option<Instant>>>,
    min_interval: Duration,
    max_attempts: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Transport {
    /// Start building a transport.
    pub fn builder() -> TransportBuilder {
        TransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the request with rate limiting and 429/5xx backoff.
    ///
    /// Any non-retryable status is returned to the caller for
    /// interpretation. Network-level failures map to
    /// [`SyncError::Connection`] and are not retried here; exhausting the
    /// backoff budget on 429/5xx yields [`SyncError::RateLimit`].
    pub async fn send(&self, builder: RequestBuilder, rate_limit: RateLimit) -> Result<Response> {
        let attempts = self.max_attempts.max(1);

        for attempt in 0..attempts {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                SyncError::Connection(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;

            let request = cloned_builder
                .build()
                .map_err(|err| SyncError::Connection(err.to_string()))?;
            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt = attempt + 1, %method, %url, "sending HTTP request");

            let response = {
                // Permit and spacing apply to request issuance only; backoff
                // sleeps happen with the permit released.
                let _permit = match rate_limit {
                    RateLimit::Enforce => Some(
                        self.semaphore
                            .clone()
                            .acquire_owned()
                            .await
                            .map_err(|_| SyncError::Connection("request limiter closed".into()))?,
                    ),
                    RateLimit::Bypass => None,
                };
                if rate_limit == RateLimit::Enforce {
                    self.pace().await;
                }
                self.client
                    .execute(request)
                    .await
                    .map_err(|err| SyncError::Connection(err.to_string()))?
            };

            let status = response.status();
            debug!(attempt = attempt + 1, %method, %url, %status, "received HTTP response");

            if !(status.as_u16() == 429 || status.is_server_error()) {
                return Ok(response);
            }

            if attempt + 1 < attempts {
                let mut delay = self.backoff_delay(attempt);
                if status.as_u16() == 429 {
                    if let Some(retry_after) = retry_after_hint(&response) {
                        delay = delay.max(retry_after);
                    }
                }
                warn!(
                    %status,
                    delay_ms = delay.as_millis() as u64,
                    attempt = attempt + 1,
                    attempts,
                    "retryable status, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(SyncError::RateLimit(format!(
            "request failed after {attempts} attempts"
        )))
    }

    /// Exponential backoff before the retry following `attempt` (0-based).
    fn backoff_delay(&self, attempt: usize) -> Duration {
        let shift = attempt.min(8) as u32;
        let multiplier = 1u32 << shift;
        self.initial_backoff.saturating_mul(multiplier).min(self.max_backoff)
    }

    /// Wait until at least `min_interval` has passed since the previous
    /// request start. The lock is held across the spacing wait so
    /// concurrent callers queue up rather than stampede, and released
    /// before the request itself.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

fn retry_after_hint(response: &Response) -> Option<Duration> {
    let secs = response.headers().get(RETRY_AFTER)?.to_str().ok()?.trim().parse::<f64>().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

/// Builder for [`Transport`].
#[derive(Debug)]
pub struct TransportBuilder {
    timeout: Duration,
    max_concurrency: usize,
    min_interval: Duration,
    max_attempts: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
    user_agent: Option<String>,
}

impl Default for TransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_concurrency: MAX_CONCURRENT_REQUESTS,
            min_interval: Duration::from_millis(MIN_REQUEST_INTERVAL_MS),
            max_attempts: MAX_BACKOFF_ATTEMPTS as usize,
            initial_backoff: Duration::from_secs(INITIAL_BACKOFF_SECS),
            max_backoff: Duration::from_secs(MAX_BACKOFF_SECS),
            user_agent: None,
        }
    }
}

impl TransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<Transport> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| SyncError::Connection(err.to_string()))?;

        Ok(Transport {
            client,
            semaphore: Arc::new(Semaphore::new(self.max_concurrency)),
            last_request: Arc::new(Mutex::new(None)),
            min_interval: self.min_interval,
            max_attempts: self.max_attempts,
            initial_backoff: self.initial_backoff,
            max_backoff: self.max_backoff,
        })
    }
}

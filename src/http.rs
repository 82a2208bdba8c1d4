//! Outbound HTTP with a per-host concurrency ceiling and bounded retries.
//!
//! [`RateLimitedFetcher::fetch`] never fails: after the configured number of
//! transport failures it logs and returns `None`, and callers treat that as
//! "unresolvable, skip". HTTP status codes are not inspected here; a 404 body
//! is handed back like any other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::HttpConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, redirect or timeout failure. Retried.
    #[error("request failed: {0}")]
    Request(String),
    /// The response arrived but its body could not be read. Not retried.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Performs a single GET and returns the raw body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> std::result::Result<Vec<u8>, FetchError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                "depsleuth/",
                env!("CARGO_PKG_VERSION"),
                " (dependency license audit)"
            ))
            // reqwest has no separate TLS-handshake or expect-continue
            // timeout; the overall timeout bounds both.
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> std::result::Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(body.to_vec())
    }
}

/// Throttling and retry knobs for [`RateLimitedFetcher`].
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub per_host_limit: usize,
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl From<&HttpConfig> for FetchPolicy {
    fn from(cfg: &HttpConfig) -> Self {
        FetchPolicy {
            per_host_limit: cfg.per_host_limit.max(1),
            poll_interval: Duration::from_millis(cfg.poll_interval_ms),
            max_attempts: cfg.max_attempts.max(1),
            retry_delay: Duration::from_millis(cfg.retry_delay_ms),
        }
    }
}

pub struct RateLimitedFetcher {
    transport: Arc<dyn Transport>,
    policy: FetchPolicy,
    in_flight: Mutex<HashMap<String, usize>>,
}

impl RateLimitedFetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: FetchPolicy) -> Self {
        Self {
            transport,
            policy,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// GET `url`, waiting for a free slot on its host first.
    pub async fn fetch(&self, url: &Url) -> Option<Vec<u8>> {
        let host = url.host_str().unwrap_or_default().to_string();
        let _slot = self.acquire(&host).await;

        debug!(%url, in_flight = self.in_flight(&host), "executing request");

        let mut attempts = 0;
        loop {
            match self.transport.get(url).await {
                Ok(body) => return Some(body),
                Err(err @ FetchError::Request(_)) => {
                    attempts += 1;
                    warn!(%url, attempt = attempts, "{err}");
                    if attempts >= self.policy.max_attempts {
                        warn!(%url, "tried {attempts} times and got errors, skipping");
                        return None;
                    }
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                Err(err @ FetchError::Body(_)) => {
                    warn!(%url, "{err}");
                    return None;
                }
            }
        }
    }

    /// Number of requests currently holding a slot for `host`.
    pub fn in_flight(&self, host: &str) -> usize {
        self.in_flight.lock().get(host).copied().unwrap_or(0)
    }

    /// Spin until `host` is below the ceiling, then take a slot. Waiters are
    /// not queued, so no ordering among them is guaranteed.
    async fn acquire(&self, host: &str) -> HostSlot<'_> {
        loop {
            {
                let mut in_flight = self.in_flight.lock();
                let running = in_flight.entry(host.to_string()).or_insert(0);
                if *running < self.policy.per_host_limit {
                    *running += 1;
                    return HostSlot {
                        in_flight: &self.in_flight,
                        host: host.to_string(),
                    };
                }
            }
            tokio::time::sleep(self.policy.poll_interval).await;
        }
    }
}

/// Releases the host slot on drop, whichever way `fetch` returns.
struct HostSlot<'a> {
    in_flight: &'a Mutex<HashMap<String, usize>>,
    host: String,
}

impl Drop for HostSlot<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock();
        if let Some(running) = in_flight.get_mut(&self.host) {
            *running = running.saturating_sub(1);
        }
    }
}

//! Per-endpoint backoff for the integration clients
//!
//! Each transient failure pushes an endpoint's next allowed attempt further
//! out. Batch jobs (email retry, bulk DNC checks) stop sending once
//! `is_backing_off` reports the window is open, and pick up on a later run.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};
use std::time::{Duration, Instant};

const FIRST_DELAY: Duration = Duration::from_secs(5);
const MAX_DELAY: Duration = Duration::from_secs(60);
/// An endpoint quiet for this long starts again from `FIRST_DELAY`
const FORGET_AFTER: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy)]
struct Backoff {
    delay: Duration,
    failed_at: Instant,
    failures: u32,
}

impl Backoff {
    fn retry_at(&self) -> Instant {
        self.failed_at + self.delay
    }
}

#[derive(Default)]
pub struct HttpRetryManager {
    endpoints: RwLock<HashMap<String, Backoff>>,
}

impl HttpRetryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance shared by all clients
    pub fn global() -> &'static HttpRetryManager {
        static GLOBAL: OnceLock<HttpRetryManager> = OnceLock::new();
        GLOBAL.get_or_init(HttpRetryManager::new)
    }

    pub fn record_success(&self, key: &str) {
        let Ok(mut endpoints) = self.endpoints.write() else {
            return;
        };
        if endpoints.remove(key).is_some() {
            log::debug!("[HTTP_RETRY] '{}' recovered", key);
        }
    }

    /// Register a transient failure and return the new delay in seconds
    pub fn record_error(&self, key: &str) -> u64 {
        let Ok(mut endpoints) = self.endpoints.write() else {
            return FIRST_DELAY.as_secs();
        };

        let now = Instant::now();
        let next = match endpoints.get(key) {
            Some(prev) if now.duration_since(prev.failed_at) <= FORGET_AFTER => Backoff {
                delay: (prev.delay * 2).min(MAX_DELAY),
                failed_at: now,
                failures: prev.failures + 1,
            },
            _ => Backoff {
                delay: FIRST_DELAY,
                failed_at: now,
                failures: 1,
            },
        };
        endpoints.insert(key.to_string(), next);

        log::warn!(
            "[HTTP_RETRY] '{}' failed {} time(s) in a row, holding off {}s",
            key,
            next.failures,
            next.delay.as_secs()
        );
        next.delay.as_secs()
    }

    /// Delay in seconds set by the last failure, if the endpoint has one
    pub fn current_delay(&self, key: &str) -> Option<u64> {
        let endpoints = self.endpoints.read().ok()?;
        endpoints.get(key).map(|b| b.delay.as_secs())
    }

    pub fn is_backing_off(&self, key: &str) -> bool {
        self.endpoints
            .read()
            .ok()
            .and_then(|endpoints| endpoints.get(key).map(|b| Instant::now() < b.retry_at()))
            .unwrap_or(false)
    }

    /// Timeouts, throttling, and gateway or origin failures (including Cloudflare's 52x)
    pub fn is_retryable_status(status: u16) -> bool {
        matches!(status, 408 | 429 | 500 | 502..=504 | 520..=524)
    }
}

pub fn is_reqwest_error_retryable(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        return true;
    }
    err.status()
        .is_some_and(|s| HttpRetryManager::is_retryable_status(s.as_u16()))
}

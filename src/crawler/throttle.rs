//! Request pacing
//!
//! Every outbound request waits on a `RateLimiter` first. Production uses
//! `PerHostDelay`, which keeps a minimum spacing between requests aimed at the
//! same host; tests inject `NoDelay`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Waits before the next request to a host
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Returns once a request to `host` may be issued
    async fn wait(&self, host: &str);
}

/// Never waits
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl RateLimiter for NoDelay {
    async fn wait(&self, _host: &str) {}
}

/// Per-host pacing state
#[derive(Debug, Clone)]
struct HostState {
    /// Earliest instant the next request may start
    next_slot: Instant,

    /// Requests granted so far
    request_count: u32,
}

/// Keeps at least `delay` between two requests to the same host
///
/// Slots are reserved under the lock and slept on outside it, so callers that
/// share one limiter are spaced correctly even when they run concurrently.
/// The first request to a host is never delayed.
#[derive(Debug)]
pub struct PerHostDelay {
    delay: Duration,
    hosts: Mutex<HashMap<String, HostState>>,
}

impl PerHostDelay {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Number of requests granted to a host
    pub fn request_count(&self, host: &str) -> u32 {
        self.hosts
            .lock()
            .map(|hosts| hosts.get(host).map(|s| s.request_count).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Reserves the next slot for a host and returns when it starts
    fn reserve(&self, host: &str, now: Instant) -> Instant {
        let mut hosts = match self.hosts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let state = hosts.entry(host.to_string()).or_insert(HostState {
            next_slot: now,
            request_count: 0,
        });

        let slot = state.next_slot.max(now);
        state.next_slot = slot + self.delay;
        state.request_count += 1;
        slot
    }
}

#[async_trait]
impl RateLimiter for PerHostDelay {
    async fn wait(&self, host: &str) {
        let now = Instant::now();
        let slot = self.reserve(host, now);

        if slot > now {
            tracing::trace!("Waiting {:?} before next request to {}", slot - now, host);
            tokio::time::sleep_until(slot).await;
        }
    }
}

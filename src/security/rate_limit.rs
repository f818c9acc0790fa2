//! Sliding-window rate limiting for contact submissions.
//!
//! Each identifier keeps the timestamps of its recent attempts. A check
//! drops timestamps older than the window, denies when the remaining count
//! has reached the limit, and otherwise records the attempt. Denied
//! attempts are not recorded.
//!
//! The check-and-record step is atomic per identifier: the store holds the
//! identifier's entry lock for the whole read-filter-append sequence, so
//! concurrent submissions from one client cannot both slip under the limit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Limit applied to every identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub max_attempts: usize,
    pub window: Duration,
}

impl From<&RateLimitConfig> for RatePolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            window: Duration::from_secs(config.window_secs),
        }
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Attempt recorded; `remaining` more fit in the current window.
    Allowed { remaining: usize },
    /// Limit reached; the oldest attempt leaves the window after `retry_after`.
    Denied { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Backing storage for attempt timestamps.
///
/// Implementations must make `check_and_record` atomic per identifier.
/// The in-memory store covers a single process; a shared store lets
/// several instances enforce one limit.
pub trait AttemptStore: Send + Sync {
    /// Prune, check and (when allowed) record an attempt at `now`.
    fn check_and_record(&self, identifier: &str, now: Instant, policy: RatePolicy) -> RateDecision;

    /// Drop expired timestamps and evict identifiers left with none.
    /// Returns the number of identifiers evicted.
    fn prune(&self, now: Instant, window: Duration) -> usize;

    /// Number of identifiers currently tracked.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store. State is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    attempts: DashMap<String, Vec<Instant>>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn in_window(now: Instant, at: Instant, window: Duration) -> bool {
    now.saturating_duration_since(at) < window
}

impl AttemptStore for InMemoryAttemptStore {
    fn check_and_record(&self, identifier: &str, now: Instant, policy: RatePolicy) -> RateDecision {
        let mut entry = self.attempts.entry(identifier.to_owned()).or_default();
        let attempts = entry.value_mut();

        attempts.retain(|at| in_window(now, *at, policy.window));

        if attempts.len() >= policy.max_attempts {
            let retry_after = attempts
                .iter()
                .min()
                .map(|oldest| policy.window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or(policy.window);
            return RateDecision::Denied { retry_after };
        }

        attempts.push(now);
        RateDecision::Allowed {
            remaining: policy.max_attempts - attempts.len(),
        }
    }

    fn prune(&self, now: Instant, window: Duration) -> usize {
        let before = self.attempts.len();
        self.attempts.retain(|_, attempts| {
            attempts.retain(|at| in_window(now, *at, window));
            !attempts.is_empty()
        });
        before.saturating_sub(self.attempts.len())
    }

    fn len(&self) -> usize {
        self.attempts.len()
    }
}

/// Rate limiter shared by all request handlers.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn AttemptStore>,
    policy: RatePolicy,
    enabled: bool,
}

impl RateLimiter {
    /// Limiter backed by the in-memory store.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            store: Arc::new(InMemoryAttemptStore::new()),
            policy: RatePolicy::from(config),
            enabled: config.enabled,
        }
    }

    /// Limiter backed by a caller-supplied store.
    pub fn with_store(store: Arc<dyn AttemptStore>, policy: RatePolicy) -> Self {
        Self {
            store,
            policy,
            enabled: true,
        }
    }

    /// Check and record an attempt for `identifier` at `now`.
    pub fn check(&self, identifier: &str, now: Instant) -> RateDecision {
        if !self.enabled {
            return RateDecision::Allowed {
                remaining: self.policy.max_attempts,
            };
        }
        self.store.check_and_record(identifier, now, self.policy)
    }

    /// Evict identifiers with no attempt inside the window.
    pub fn sweep(&self, now: Instant) -> usize {
        let evicted = self.store.prune(now, self.policy.window);
        metrics::record_tracked_identifiers(self.store.len());
        evicted
    }

    pub fn tracked_identifiers(&self) -> usize {
        self.store.len()
    }

    /// Periodically sweep until shutdown is signalled.
    pub async fn run_sweeper(self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately; nothing to sweep yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.sweep(Instant::now());
                    if evicted > 0 {
                        tracing::debug!(
                            evicted,
                            tracked = self.tracked_identifiers(),
                            "Evicted idle rate-limit identifiers"
                        );
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate-limit sweeper stopping");
                    break;
                }
            }
        }
    }
}

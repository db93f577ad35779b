//! In-memory rate limiting for credential sign-in attempts.
//!
//! DESIGN
//! ======
//! Sliding-window counters backed by `HashMap<String, VecDeque<Instant>>`.
//! Two limits enforced:
//! - Per-key: 5 attempts/min, keyed by normalized email
//! - Per-client: 30 attempts/min, keyed by peer address
//!
//! Keys are attacker-chosen, so any key whose window has drained is dropped
//! on a periodic sweep. The map only ever holds keys seen within the last
//! window.
//!
//! TRADE-OFFS
//! ==========
//! State is per process. Behind several replicas each one enforces its own
//! window, which loosens the effective limit but needs no shared store.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const DEFAULT_PER_KEY_LIMIT: usize = 5;
pub const DEFAULT_PER_KEY_WINDOW_SECS: u64 = 60;

pub const DEFAULT_PER_CLIENT_LIMIT: usize = 30;
pub const DEFAULT_PER_CLIENT_WINDOW_SECS: u64 = 60;

/// Client key used when the peer address is unknown.
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_key_limit: usize,
    pub per_key_window: Duration,
    pub per_client_limit: usize,
    pub per_client_window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_key_limit: DEFAULT_PER_KEY_LIMIT,
            per_key_window: Duration::from_secs(DEFAULT_PER_KEY_WINDOW_SECS),
            per_client_limit: DEFAULT_PER_CLIENT_LIMIT,
            per_client_window: Duration::from_secs(DEFAULT_PER_CLIENT_WINDOW_SECS),
        }
    }
}

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[allow(clippy::enum_variant_names)]
pub enum RateLimitError {
    #[error("too many attempts (max {limit} per {window_secs}s)")]
    PerKeyExceeded { limit: usize, window_secs: u64 },
    #[error("per-client rate limit exceeded (max {limit} requests/{window_secs}s)")]
    PerClientExceeded { limit: usize, window_secs: u64 },
}

impl RateLimitError {
    /// Seconds until the caller may reasonably retry.
    #[must_use]
    pub fn retry_after_secs(&self) -> u64 {
        match self {
            Self::PerKeyExceeded { window_secs, .. } | Self::PerClientExceeded { window_secs, .. } => *window_secs,
        }
    }
}

// =============================================================================
// RATE LIMITER
// =============================================================================

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
    config: RateLimitConfig,
}

struct RateLimiterInner {
    /// Per-key attempt timestamps.
    key_attempts: HashMap<String, VecDeque<Instant>>,
    /// Per-client attempt timestamps.
    client_attempts: HashMap<String, VecDeque<Instant>>,
    last_sweep: Option<Instant>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RateLimiterInner {
                key_attempts: HashMap::new(),
                client_attempts: HashMap::new(),
                last_sweep: None,
            })),
            config,
        }
    }

    /// Check both per-client and per-key limits, then record the attempt.
    ///
    /// # Errors
    ///
    /// Returns which limit was hit; the attempt is not recorded.
    pub fn check_and_record(&self, client: &str, key: &str) -> Result<(), RateLimitError> {
        self.check_and_record_at(client, key, Instant::now())
    }

    fn check_and_record_at(&self, client: &str, key: &str, now: Instant) -> Result<(), RateLimitError> {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let inner = &mut *guard;
        let cfg = self.config;

        inner.sweep(now, &cfg);

        if window_len(&mut inner.client_attempts, client, now, cfg.per_client_window) >= cfg.per_client_limit {
            return Err(RateLimitError::PerClientExceeded {
                limit: cfg.per_client_limit,
                window_secs: cfg.per_client_window.as_secs(),
            });
        }
        if window_len(&mut inner.key_attempts, key, now, cfg.per_key_window) >= cfg.per_key_limit {
            return Err(RateLimitError::PerKeyExceeded {
                limit: cfg.per_key_limit,
                window_secs: cfg.per_key_window.as_secs(),
            });
        }

        inner
            .client_attempts
            .entry(client.to_owned())
            .or_default()
            .push_back(now);
        inner
            .key_attempts
            .entry(key.to_owned())
            .or_default()
            .push_back(now);

        Ok(())
    }

    /// Forget a key's attempts, e.g. after a successful sign-in.
    pub fn reset(&self, key: &str) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.key_attempts.remove(key);
    }

    /// Number of keys and clients currently tracked.
    #[cfg(test)]
    fn tracked(&self) -> (usize, usize) {
        let inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        (inner.key_attempts.len(), inner.client_attempts.len())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl RateLimiterInner {
    /// Drop every drained key, at most once per window.
    fn sweep(&mut self, now: Instant, cfg: &RateLimitConfig) {
        let interval = cfg.per_key_window.min(cfg.per_client_window);
        if self
            .last_sweep
            .is_some_and(|last| now.duration_since(last) < interval)
        {
            return;
        }
        self.last_sweep = Some(now);
        retain_live(&mut self.key_attempts, now, cfg.per_key_window);
        retain_live(&mut self.client_attempts, now, cfg.per_client_window);
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) > window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

/// Attempts for `key` still inside the window. Never inserts the key.
fn window_len(map: &mut HashMap<String, VecDeque<Instant>>, key: &str, now: Instant, window: Duration) -> usize {
    let Some(deque) = map.get_mut(key) else {
        return 0;
    };
    prune_window(deque, now, window);
    let len = deque.len();
    if len == 0 {
        map.remove(key);
    }
    len
}

fn retain_live(map: &mut HashMap<String, VecDeque<Instant>>, now: Instant, window: Duration) {
    map.retain(|_, deque| {
        prune_window(deque, now, window);
        !deque.is_empty()
    });
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;

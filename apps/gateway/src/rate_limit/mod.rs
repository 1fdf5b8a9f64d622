//! Fixed-window request counting.
//!
//! Windows are aligned to the wall clock: a request at `now` belongs to the
//! window starting at `now - (now mod window)`. The window start is part of
//! the counter key, so a new window always starts from zero.

pub mod key;
pub mod memory;
pub mod redis_store;
pub mod store;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub use key::{client_key, ClientKeySource};
pub use memory::InMemoryCounterStore;
pub use redis_store::RedisCounterStore;
pub use store::{CounterStore, StoreError};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateClass {
    /// General API traffic
    Api,
    /// Register / login attempts
    Auth,
    /// Product search listing
    Search,
}

impl RateClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            RateClass::Api => "api",
            RateClass::Auth => "auth",
            RateClass::Search => "search",
        }
    }

    pub const fn rejection_message(self) -> &'static str {
        match self {
            RateClass::Api => "Too many requests, please try again later.",
            RateClass::Auth => "Too many authentication attempts, please try again later.",
            RateClass::Search => "Too many search requests, please slow down.",
        }
    }
}

impl fmt::Display for RateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub max_requests: u64,
}

impl RateLimitPolicy {
    pub const fn new(window: Duration, max_requests: u64) -> Self {
        Self {
            window,
            max_requests,
        }
    }
}

/// Per-class policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub api: RateLimitPolicy,
    pub auth: RateLimitPolicy,
    pub search: RateLimitPolicy,
}

impl RateLimitSettings {
    pub fn policy(&self, class: RateClass) -> RateLimitPolicy {
        match class {
            RateClass::Api => self.api,
            RateClass::Auth => self.auth,
            RateClass::Search => self.search,
        }
    }

    pub fn set(&mut self, class: RateClass, policy: RateLimitPolicy) {
        match class {
            RateClass::Api => self.api = policy,
            RateClass::Auth => self.auth = policy,
            RateClass::Search => self.search = policy,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            api: RateLimitPolicy::new(Duration::from_secs(15 * 60), 100),
            auth: RateLimitPolicy::new(Duration::from_secs(5 * 60), 20),
            search: RateLimitPolicy::new(Duration::from_secs(60), 30),
        }
    }
}

/// Where `now` falls inside its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPosition {
    /// Window start, milliseconds since the Unix epoch
    pub start_ms: u64,
    /// Time left until the next window starts
    pub remaining: Duration,
}

pub fn window_position(now: SystemTime, window: Duration) -> WindowPosition {
    let now_ms = now
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    let window_ms = (window.as_millis() as u64).max(1);
    let offset = now_ms % window_ms;

    WindowPosition {
        start_ms: now_ms - offset,
        remaining: Duration::from_millis(window_ms - offset),
    }
}

/// Outcome of counting one request against one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub class: RateClass,
    pub limit: u64,
    pub count: u64,
    pub reset_after: Duration,
}

impl RateDecision {
    pub fn allowed(&self) -> bool {
        self.count <= self.limit
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.count)
    }

    pub fn rejection(&self) -> AppError {
        AppError::RateLimited {
            message: self.class.rejection_message(),
            retry_after: self.reset_after,
        }
    }
}

/// Source of "now" for window placement.
pub type Clock = Arc<dyn Fn() -> SystemTime + Send + Sync>;

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    settings: RateLimitSettings,
    clock: Clock,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, settings: RateLimitSettings) -> Self {
        Self {
            store,
            settings,
            clock: Arc::new(SystemTime::now),
        }
    }

    /// Place windows using `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &RateLimitSettings {
        &self.settings
    }

    pub async fn check(
        &self,
        class: RateClass,
        client_key: &str,
    ) -> Result<RateDecision, StoreError> {
        self.check_at(class, client_key, (self.clock)()).await
    }

    /// Count one request from `client_key` against `class` as of `now`.
    pub async fn check_at(
        &self,
        class: RateClass,
        client_key: &str,
        now: SystemTime,
    ) -> Result<RateDecision, StoreError> {
        let policy = self.settings.policy(class);
        let position = window_position(now, policy.window);
        let key = format!("ratelimit:{class}:{client_key}:{}", position.start_ms);

        let count = self.store.increment(&key, policy.window).await?;

        Ok(RateDecision {
            class,
            limit: policy.max_requests,
            count,
            reset_after: position.remaining,
        })
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

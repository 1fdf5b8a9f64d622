use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::store::{CounterStore, StoreError};

/// Expired windows are swept once every this many increments.
const PRUNE_EVERY: u64 = 1024;

#[derive(Debug)]
struct WindowCounter {
    count: u64,
    expires_at: Instant,
}

/// Process-local counter store for single-instance deployments and tests.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: DashMap<String, WindowCounter>,
    ops: AtomicU64,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys (expired keys may linger until the next sweep).
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    fn prune(&self, now: Instant) {
        self.counters.retain(|_, counter| counter.expires_at > now);
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        let now = Instant::now();

        // The shard lock is held for the whole read-modify-write.
        let count = {
            let mut counter = self
                .counters
                .entry(key.to_string())
                .or_insert_with(|| WindowCounter {
                    count: 0,
                    expires_at: now + window,
                });
            if counter.expires_at <= now {
                counter.count = 0;
                counter.expires_at = now + window;
            }
            counter.count += 1;
            counter.count
        };

        if self.ops.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune(now);
        }

        Ok(count)
    }
}

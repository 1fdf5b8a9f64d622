use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
}

/// Shared request counters.
///
/// `increment` must be atomic per key: concurrent callers each observe a
/// distinct count. The key expires `window` after its first increment.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, StoreError>;
}

use std::sync::Arc;

use tracing::info;

use crate::config::GatewayConfig;
use crate::downstream::DownstreamClient;
use crate::error::AppError;
use crate::rate_limit::{CounterStore, InMemoryCounterStore, RateLimiter, RedisCounterStore};
use crate::state::app_state::AppState;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    config: GatewayConfig,
    counter_store: Option<Arc<dyn CounterStore>>,
}

impl StateBuilder {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            counter_store: None,
        }
    }

    /// Use this store instead of the one `REDIS_URL` would select.
    pub fn with_counter_store(mut self, store: Arc<dyn CounterStore>) -> Self {
        self.counter_store = Some(store);
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let store: Arc<dyn CounterStore> = match (self.counter_store, &self.config.redis_url) {
            (Some(store), _) => store,
            (None, Some(url)) => {
                let store = RedisCounterStore::connect(url).await?;
                info!("rate limit counters backed by redis");
                Arc::new(store)
            }
            (None, None) => {
                info!("rate limit counters held in memory");
                Arc::new(InMemoryCounterStore::new())
            }
        };

        let rate_limiter = RateLimiter::new(store, self.config.rate_limits);
        let downstream =
            DownstreamClient::new(self.config.services.clone(), self.config.downstream_timeout)?;

        Ok(AppState::new(self.config, downstream, rate_limiter))
    }
}

pub fn build_state(config: GatewayConfig) -> StateBuilder {
    StateBuilder::new(config)
}

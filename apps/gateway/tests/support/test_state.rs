use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gateway::config::{GatewayConfig, ServiceUrls};
use gateway::infra::state::build_state;
use gateway::rate_limit::InMemoryCounterStore;
use gateway::state::app_state::AppState;
use gateway::SecurityConfig;
use wiremock::MockServer;

pub const TEST_SECRET: &str = "integration_test_secret_key_only";

/// One wiremock server per downstream collaborator.
pub struct Upstreams {
    pub users: MockServer,
    pub products: MockServer,
    pub orders: MockServer,
}

impl Upstreams {
    pub async fn start() -> Self {
        Self {
            users: MockServer::start().await,
            products: MockServer::start().await,
            orders: MockServer::start().await,
        }
    }

    pub fn security() -> SecurityConfig {
        SecurityConfig::new(TEST_SECRET)
    }

    /// Gateway defaults pointed at these servers, with a short downstream
    /// timeout so failure tests stay fast.
    pub fn config(&self) -> GatewayConfig {
        let mut config = GatewayConfig::new(Self::security());
        config.services = ServiceUrls::new(self.users.uri(), self.products.uri(), self.orders.uri());
        config.downstream_timeout = Duration::from_millis(500);
        config
    }

    pub async fn state(&self) -> AppState {
        state_from(self.config()).await
    }
}

/// Rate-limit "now" for tests: 30s into a minute, 210s into five minutes
/// and 810s into fifteen. The clock never moves, so no window ends mid-test.
pub fn fixed_now() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_700_000_010)
}

/// Fresh in-memory counters per state so tests never share a budget, placed
/// on a fixed clock so counts never straddle a window boundary.
pub async fn state_from(config: GatewayConfig) -> AppState {
    let mut state = build_state(config)
        .with_counter_store(Arc::new(InMemoryCounterStore::new()))
        .build()
        .await
        .expect("test state should build");
    state.rate_limiter = state.rate_limiter.with_clock(Arc::new(fixed_now));
    state
}

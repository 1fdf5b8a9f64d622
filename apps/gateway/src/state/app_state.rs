use std::sync::Arc;

use super::security_config::SecurityConfig;
use crate::config::GatewayConfig;
use crate::downstream::{DownstreamClient, IdentityClient};
use crate::rate_limit::RateLimiter;

/// Application state shared by every worker.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    /// Client for forwarded routes
    pub downstream: DownstreamClient,
    /// User-service calls made by the auth flows
    pub identity: IdentityClient,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        config: GatewayConfig,
        downstream: DownstreamClient,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            config: Arc::new(config),
            identity: IdentityClient::new(downstream.clone()),
            downstream,
            rate_limiter,
        }
    }

    pub fn security(&self) -> &SecurityConfig {
        &self.config.security
    }
}

pub mod gateway;

use crate::downstream::Service;

pub use gateway::{parse_ttl, GatewayConfig};

/// Deployment environment, from `GATEWAY_ENV`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuntimeEnv {
    #[default]
    Development,
    Test,
    Production,
}

impl RuntimeEnv {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "test" => Some(Self::Test),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Base URLs of the downstream collaborators, without trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrls {
    pub users: String,
    pub products: String,
    pub orders: String,
}

impl ServiceUrls {
    pub fn new(
        users: impl Into<String>,
        products: impl Into<String>,
        orders: impl Into<String>,
    ) -> Self {
        Self {
            users: trim_base(users.into()),
            products: trim_base(products.into()),
            orders: trim_base(orders.into()),
        }
    }

    pub fn base(&self, service: Service) -> &str {
        match service {
            Service::Users => &self.users,
            Service::Products => &self.products,
            Service::Orders => &self.orders,
        }
    }
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self::new(
            "http://localhost:8002",
            "http://localhost:8001",
            "http://localhost:8003",
        )
    }
}

fn trim_base(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

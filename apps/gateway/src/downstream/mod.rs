//! Outbound calls to the collaborators behind the gateway.

pub mod client;
pub mod identity;

use std::fmt;

pub use client::{DownstreamClient, DownstreamRequest, DownstreamResponse, IdentityHeader};
pub use identity::{Credentials, IdentityClient, Registration, UserRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Users,
    Products,
    Orders,
}

impl Service {
    pub const fn name(self) -> &'static str {
        match self {
            Service::Users => "user-service",
            Service::Products => "product-service",
            Service::Orders => "order-service",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! The gateway's route table.
//!
//! Every public endpoint is one `RouteEntry`. Each entry becomes a resource
//! guarded by its method and wrapped, outermost first, in the rate limiter
//! for its classes and then the auth gate for its mode.

use actix_web::dev::HttpServiceFactory;
use actix_web::http::{Method, StatusCode};
use actix_web::{guard, web, HttpRequest};

use super::{auth, forward, health};
use crate::auth::Role;
use crate::downstream::{IdentityHeader, Service};
use crate::extractors::MaybeIdentity;
use crate::middleware::{AuthGate, AuthMode, RateLimit};
use crate::rate_limit::RateClass;
use crate::state::app_state::AppState;

/// Where a forwarded route goes and what it carries.
#[derive(Debug)]
pub struct ForwardTarget {
    pub service: Service,
    /// Downstream path; `{name}` segments are filled from the matched route
    pub upstream_path: &'static str,
    pub identity_headers: &'static [IdentityHeader],
    /// Callers below this role get 403 without a downstream call
    pub min_role: Option<Role>,
    /// Query parameters passed through; everything else is dropped
    pub query_params: &'static [&'static str],
    /// Replaces the downstream success status when set
    pub success_status: Option<StatusCode>,
}

#[derive(Debug)]
pub enum Handler {
    Health,
    Register,
    Login,
    Verify,
    Forward(ForwardTarget),
}

#[derive(Debug)]
pub struct RouteEntry {
    pub method: Method,
    pub path: &'static str,
    pub rate_classes: &'static [RateClass],
    pub auth: AuthMode,
    pub handler: Handler,
}

const API: &[RateClass] = &[RateClass::Api];
const AUTH: &[RateClass] = &[RateClass::Auth];
const SEARCH: &[RateClass] = &[RateClass::Api, RateClass::Search];

const USER_ID: &[IdentityHeader] = &[IdentityHeader::UserId];
const USER_ID_ROLE: &[IdentityHeader] = &[IdentityHeader::UserId, IdentityHeader::UserRole];
const USER_ID_EMAIL: &[IdentityHeader] = &[IdentityHeader::UserId, IdentityHeader::UserEmail];

const PRODUCT_SEARCH_PARAMS: &[&str] = &["search", "category", "minPrice", "maxPrice"];

const fn target(
    service: Service,
    upstream_path: &'static str,
    identity_headers: &'static [IdentityHeader],
) -> ForwardTarget {
    ForwardTarget {
        service,
        upstream_path,
        identity_headers,
        min_role: None,
        query_params: &[],
        success_status: None,
    }
}

pub static ROUTES: &[RouteEntry] = &[
    RouteEntry {
        method: Method::GET,
        path: "/health",
        rate_classes: &[],
        auth: AuthMode::None,
        handler: Handler::Health,
    },
    RouteEntry {
        method: Method::POST,
        path: "/api/auth/register",
        rate_classes: AUTH,
        auth: AuthMode::None,
        handler: Handler::Register,
    },
    RouteEntry {
        method: Method::POST,
        path: "/api/auth/login",
        rate_classes: AUTH,
        auth: AuthMode::None,
        handler: Handler::Login,
    },
    RouteEntry {
        method: Method::GET,
        path: "/api/auth/verify",
        rate_classes: &[],
        auth: AuthMode::Required,
        handler: Handler::Verify,
    },
    // Products
    RouteEntry {
        method: Method::GET,
        path: "/api/products",
        rate_classes: SEARCH,
        auth: AuthMode::Optional,
        handler: Handler::Forward(ForwardTarget {
            query_params: PRODUCT_SEARCH_PARAMS,
            ..target(Service::Products, "/api/products", &[])
        }),
    },
    RouteEntry {
        method: Method::GET,
        path: "/api/products/{id}",
        rate_classes: API,
        auth: AuthMode::Optional,
        handler: Handler::Forward(target(Service::Products, "/api/products/{id}", &[])),
    },
    RouteEntry {
        method: Method::POST,
        path: "/api/products",
        rate_classes: API,
        auth: AuthMode::Required,
        handler: Handler::Forward(ForwardTarget {
            min_role: Some(Role::Admin),
            success_status: Some(StatusCode::CREATED),
            ..target(Service::Products, "/api/products", USER_ID_ROLE)
        }),
    },
    RouteEntry {
        method: Method::PUT,
        path: "/api/products/{id}",
        rate_classes: API,
        auth: AuthMode::Required,
        handler: Handler::Forward(ForwardTarget {
            min_role: Some(Role::Admin),
            ..target(Service::Products, "/api/products/{id}", USER_ID_ROLE)
        }),
    },
    RouteEntry {
        method: Method::DELETE,
        path: "/api/products/{id}",
        rate_classes: API,
        auth: AuthMode::Required,
        handler: Handler::Forward(ForwardTarget {
            min_role: Some(Role::Admin),
            ..target(Service::Products, "/api/products/{id}", USER_ID_ROLE)
        }),
    },
    // Orders
    RouteEntry {
        method: Method::GET,
        path: "/api/orders",
        rate_classes: API,
        auth: AuthMode::Required,
        handler: Handler::Forward(target(Service::Orders, "/api/orders", USER_ID)),
    },
    RouteEntry {
        method: Method::GET,
        path: "/api/orders/{id}",
        rate_classes: API,
        auth: AuthMode::Required,
        handler: Handler::Forward(target(Service::Orders, "/api/orders/{id}", USER_ID)),
    },
    RouteEntry {
        method: Method::POST,
        path: "/api/orders",
        rate_classes: API,
        auth: AuthMode::Required,
        handler: Handler::Forward(ForwardTarget {
            success_status: Some(StatusCode::CREATED),
            ..target(Service::Orders, "/api/orders", USER_ID_EMAIL)
        }),
    },
    RouteEntry {
        method: Method::PATCH,
        path: "/api/orders/{id}/cancel",
        rate_classes: API,
        auth: AuthMode::Required,
        handler: Handler::Forward(target(Service::Orders, "/api/orders/{id}/cancel", USER_ID)),
    },
];

/// Build the actix resource for one entry.
pub fn resource(entry: &'static RouteEntry) -> impl HttpServiceFactory {
    let base = web::resource(entry.path).guard(guard::Method(entry.method.clone()));

    let base = match &entry.handler {
        Handler::Health => base.to(health::health),
        Handler::Register => base.to(auth::register),
        Handler::Login => base.to(auth::login),
        Handler::Verify => base.to(auth::verify),
        Handler::Forward(target) => base.to(
            move |req: HttpRequest,
                  body: web::Bytes,
                  state: web::Data<AppState>,
                  identity: MaybeIdentity| {
                forward::forward(target, req, body, state, identity)
            },
        ),
    };

    base.wrap(AuthGate::new(entry.auth))
        .wrap(RateLimit::new(entry.rate_classes))
}

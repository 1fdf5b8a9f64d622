//! Per-route rate limiting.
//!
//! Each wrapped route names one or more classes; a request is counted against
//! every class in order and rejected with 429 by the first one it exceeds.
//! Passing responses carry `x-ratelimit-*` headers for whichever class has the
//! fewest requests left. If the counter store fails the request is let through.

use std::rc::Rc;

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue};
use actix_web::{web, Error};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use tracing::{debug, warn};

use crate::error::retry_after_secs;
use crate::rate_limit::{client_key, RateClass, RateDecision};
use crate::state::app_state::AppState;

pub struct RateLimit {
    classes: &'static [RateClass],
}

impl RateLimit {
    pub fn new(classes: &'static [RateClass]) -> Self {
        Self { classes }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            classes: self.classes,
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    classes: &'static [RateClass],
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let classes = self.classes;

        Box::pin(async move {
            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                return service.call(req).await.map(ServiceResponse::map_into_left_body);
            };
            let key = client_key(&req, state.config.client_key);

            let mut tightest: Option<RateDecision> = None;
            for &class in classes {
                match state.rate_limiter.check(class, &key).await {
                    Ok(decision) if !decision.allowed() => {
                        debug!(
                            class = %class,
                            client = %key,
                            count = decision.count,
                            "rate limit exceeded"
                        );
                        return Ok(req
                            .error_response(decision.rejection())
                            .map_into_right_body());
                    }
                    Ok(decision) => {
                        if tightest.map_or(true, |t| decision.remaining() < t.remaining()) {
                            tightest = Some(decision);
                        }
                    }
                    Err(err) => {
                        warn!(
                            class = %class,
                            client = %key,
                            error = %err,
                            "rate limit check skipped"
                        );
                    }
                }
            }

            let mut res = service.call(req).await?;
            if let Some(decision) = tightest {
                insert_limit_headers(res.headers_mut(), &decision);
            }

            Ok(res.map_into_left_body())
        })
    }
}

fn insert_limit_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    let values = [
        ("x-ratelimit-limit", decision.limit),
        ("x-ratelimit-remaining", decision.remaining()),
        ("x-ratelimit-reset", retry_after_secs(decision.reset_after)),
    ];
    for (name, value) in values {
        headers.insert(HeaderName::from_static(name), HeaderValue::from(value));
    }
}

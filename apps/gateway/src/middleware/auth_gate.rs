//! Bearer token gate.
//!
//! `Required` rejects with 401 unless a valid token is presented. `Optional`
//! attaches the identity when a valid token is presented and otherwise lets
//! the request through anonymously. `None` does nothing. A verified
//! `IdentityClaim` is stored in request extensions for the `Identity`
//! extractors.

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderValue};
use actix_web::{web, Error, HttpMessage};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use tracing::debug;

use super::trace_span::record_user;
use crate::auth::{verify_token, IdentityClaim, TokenError};
use crate::error::{AppError, AuthFailure};
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Required,
    Optional,
    None,
}

/// Check an `Authorization` header value.
pub fn authenticate(
    header_value: Option<&HeaderValue>,
    security: &SecurityConfig,
) -> Result<IdentityClaim, AuthFailure> {
    let raw = header_value.ok_or(AuthFailure::MissingToken)?;
    let raw = raw.to_str().map_err(|_| AuthFailure::BadScheme)?;

    let parts: Vec<&str> = raw.split_whitespace().collect();
    let token = match parts.as_slice() {
        [] => return Err(AuthFailure::MissingToken),
        ["Bearer", token] => *token,
        _ => return Err(AuthFailure::BadScheme),
    };

    verify_token(token, security).map_err(|e| match e {
        TokenError::Expired => AuthFailure::Expired,
        TokenError::Malformed => AuthFailure::Malformed,
    })
}

pub struct AuthGate {
    mode: AuthMode,
}

impl AuthGate {
    pub fn new(mode: AuthMode) -> Self {
        Self { mode }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service,
            mode: self.mode,
        }))
    }
}

pub struct AuthGateMiddleware<S> {
    service: S,
    mode: AuthMode,
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if self.mode == AuthMode::None {
            return pass_through(self.service.call(req));
        }

        let app_state = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state.clone(),
            None => return reject(req, AppError::internal("AppState not available")),
        };

        let outcome = authenticate(req.headers().get(header::AUTHORIZATION), app_state.security());

        match (outcome, self.mode) {
            (Ok(claim), _) => {
                record_user(&claim.sub);
                req.extensions_mut().insert(claim);
                pass_through(self.service.call(req))
            }
            (Err(failure), AuthMode::Optional) => {
                if failure != AuthFailure::MissingToken {
                    debug!(?failure, "ignoring unusable token on optional-auth route");
                }
                pass_through(self.service.call(req))
            }
            (Err(failure), _) => reject(req, AppError::unauthorized(failure)),
        }
    }
}

fn pass_through<F, B>(fut: F) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>>
where
    F: std::future::Future<Output = Result<ServiceResponse<B>, Error>> + 'static,
    B: MessageBody + 'static,
{
    Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
}

/// Rendered when polled, so the body sees the request's trace context.
fn reject<B>(
    req: ServiceRequest,
    err: AppError,
) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>>
where
    B: MessageBody + 'static,
{
    Box::pin(async move { Ok(req.error_response(err).map_into_right_body()) })
}

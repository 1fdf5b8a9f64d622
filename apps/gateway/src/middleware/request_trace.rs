//! Per-request trace id.
//!
//! Generates the id, stores it in request extensions for `TraceSpan` and
//! `StructuredLogger`, and runs the rest of the chain inside a task-local
//! `RequestContext`. Inner middlewares render their rejections themselves,
//! while still inside that context, so every error body and `x-trace-id`
//! header sees the id.

use actix_web::body::MessageBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{web, HttpMessage};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use uuid::Uuid;

use crate::state::app_state::AppState;
use crate::trace_ctx::{self, RequestContext};

/// Trace id stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

pub struct RequestTrace;

impl<S, B> Transform<S, ServiceRequest> for RequestTrace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RequestTraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTraceMiddleware { service }))
    }
}

pub struct RequestTraceMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestTraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = Uuid::new_v4().to_string();
        let expose_diagnostics = req
            .app_data::<web::Data<AppState>>()
            .map(|state| state.config.diagnostics_enabled())
            .unwrap_or(false);

        req.extensions_mut().insert(TraceId(trace_id.clone()));

        let ctx = RequestContext {
            trace_id: trace_id.clone(),
            expose_diagnostics,
        };
        let fut = self.service.call(req);

        Box::pin(trace_ctx::with_context(ctx, async move {
            let mut res = fut.await?;

            if let Ok(value) = HeaderValue::from_str(&trace_id) {
                res.headers_mut()
                    .insert(HeaderName::from_static("x-request-id"), value);
            }

            Ok(res)
        }))
    }
}

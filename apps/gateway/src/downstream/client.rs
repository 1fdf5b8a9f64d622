use std::time::{Duration, Instant};

use actix_web::http::{Method, StatusCode};
use actix_web::HttpResponse;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::Service;
use crate::auth::IdentityClaim;
use crate::config::ServiceUrls;
use crate::error::AppError;
use crate::trace_ctx;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identity headers derived from a verified claim. Nothing else about the
/// caller is forwarded; the bearer token in particular never leaves the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityHeader {
    UserId,
    UserEmail,
    UserRole,
}

impl IdentityHeader {
    pub const fn header_name(self) -> &'static str {
        match self {
            IdentityHeader::UserId => "x-user-id",
            IdentityHeader::UserEmail => "x-user-email",
            IdentityHeader::UserRole => "x-user-role",
        }
    }

    pub fn value(self, claim: &IdentityClaim) -> String {
        match self {
            IdentityHeader::UserId => claim.sub.clone(),
            IdentityHeader::UserEmail => claim.email.clone(),
            IdentityHeader::UserRole => claim.role.as_str().to_string(),
        }
    }
}

/// One outbound call.
#[derive(Debug, Clone)]
pub struct DownstreamRequest {
    pub method: Method,
    pub service: Service,
    /// Path relative to the service base URL, already encoded
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Bytes>,
    pub content_type: Option<String>,
}

impl DownstreamRequest {
    pub fn new(method: Method, service: Service, path: impl Into<String>) -> Self {
        Self {
            method,
            service,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            content_type: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_identity(mut self, claim: &IdentityClaim, headers: &[IdentityHeader]) -> Self {
        for header in headers {
            self.headers.push((header.header_name(), header.value(claim)));
        }
        self
    }

    pub fn with_body(mut self, body: Bytes, content_type: Option<String>) -> Self {
        self.body = Some(body);
        self.content_type = content_type;
        self
    }

    pub fn json<T: Serialize>(self, payload: &T) -> Result<Self, AppError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| AppError::internal(format!("Failed to encode request body: {e}")))?;
        Ok(self.with_body(Bytes::from(body), Some("application/json".to_string())))
    }
}

/// A non-error response from a collaborator.
#[derive(Debug, Clone)]
pub struct DownstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
    pub content_type: Option<String>,
}

impl DownstreamResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| AppError::internal(format!("Unexpected downstream payload: {e}")))
    }

    /// Relay to the client, optionally replacing the status.
    pub fn into_http_response(self, status: Option<StatusCode>) -> HttpResponse {
        let mut builder = HttpResponse::build(status.unwrap_or(self.status));
        if let Some(content_type) = self.content_type {
            builder.content_type(content_type);
        }
        builder.body(self.body)
    }
}

/// HTTP client shared by every request handler.
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    http: reqwest::Client,
    urls: ServiceUrls,
}

impl DownstreamClient {
    pub fn new(urls: ServiceUrls, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, urls })
    }

    pub fn urls(&self) -> &ServiceUrls {
        &self.urls
    }

    /// Perform exactly one attempt.
    ///
    /// No response (refused, reset, timeout, unreadable body) is
    /// `UpstreamUnavailable`; a response with status >= 400 is `Upstream`
    /// carrying that status and body unchanged.
    pub async fn forward(&self, req: DownstreamRequest) -> Result<DownstreamResponse, AppError> {
        let service = req.service;
        let url = format!("{}{}", self.urls.base(service), req.path);
        let method = reqwest::Method::from_bytes(req.method.as_str().as_bytes())
            .map_err(|e| AppError::internal(format!("Unsupported method: {e}")))?;

        let mut builder = self
            .http
            .request(method, &url)
            .header(REQUEST_ID_HEADER, trace_ctx::trace_id());
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        for (name, value) in &req.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(content_type) = &req.content_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, content_type.as_str());
        }
        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(|e| unavailable(service, &e))?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .map_err(|e| AppError::internal(format!("Invalid downstream status: {e}")))?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| unavailable(service, &e))?;

        debug!(
            service = %service,
            method = %req.method,
            path = %req.path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "downstream call completed"
        );

        if status.is_client_error() || status.is_server_error() {
            return Err(AppError::Upstream {
                service: service.name(),
                status,
                body,
                content_type,
            });
        }

        Ok(DownstreamResponse {
            status,
            body,
            content_type,
        })
    }
}

fn unavailable(service: Service, err: &reqwest::Error) -> AppError {
    if err.is_builder() {
        return AppError::internal(format!("Invalid request to {service}: {err}"));
    }
    warn!(service = %service, timeout = err.is_timeout(), error = %err, "downstream unreachable");
    AppError::UpstreamUnavailable {
        service: service.name(),
        detail: err.to_string(),
    }
}

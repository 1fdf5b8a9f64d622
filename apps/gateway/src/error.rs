use std::time::Duration;

use actix_web::error::ResponseError;
use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::errors::ErrorCode;
use crate::trace_ctx;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Uniform JSON body for every gateway-generated error.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

/// Why a bearer token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingToken,
    BadScheme,
    Expired,
    Malformed,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },
    #[error("Duplicate value: {detail}")]
    Duplicate { detail: String },
    #[error("Invalid format: {detail}")]
    InvalidFormat { detail: String },
    #[error("Unauthorized: {0:?}")]
    Unauthorized(AuthFailure),
    #[error("Forbidden")]
    Forbidden,
    #[error("Route not found")]
    RouteNotFound,
    #[error("Rate limited: {message}")]
    RateLimited {
        message: &'static str,
        retry_after: Duration,
    },
    #[error("{service} unavailable: {detail}")]
    UpstreamUnavailable {
        service: &'static str,
        detail: String,
    },
    #[error("{service} responded with {status}")]
    Upstream {
        service: &'static str,
        status: StatusCode,
        body: Bytes,
        content_type: Option<String>,
    },
    #[error("{message}")]
    Application { status: StatusCode, message: String },
    #[error("Internal error: {detail}")]
    Internal { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl AppError {
    /// Machine-readable code used in logs.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::Duplicate { .. } => ErrorCode::DuplicateField,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::Unauthorized(AuthFailure::MissingToken) => {
                ErrorCode::UnauthorizedMissingToken
            }
            AppError::Unauthorized(AuthFailure::BadScheme) => ErrorCode::UnauthorizedBadScheme,
            AppError::Unauthorized(AuthFailure::Expired) => ErrorCode::UnauthorizedExpiredToken,
            AppError::Unauthorized(AuthFailure::Malformed) => ErrorCode::UnauthorizedInvalidToken,
            AppError::Forbidden => ErrorCode::Forbidden,
            AppError::RouteNotFound => ErrorCode::RouteNotFound,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::UpstreamUnavailable { .. } => ErrorCode::UpstreamUnavailable,
            AppError::Upstream { .. } => ErrorCode::UpstreamError,
            AppError::Application { .. } => ErrorCode::ApplicationError,
            AppError::Internal { .. } => ErrorCode::Internal,
            AppError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    /// Client-facing message. Server-side detail never appears here.
    pub fn message(&self) -> String {
        match self {
            AppError::Validation { message, .. } => message.clone(),
            AppError::Duplicate { .. } => "Duplicate field value entered".to_string(),
            AppError::InvalidFormat { detail } => detail.clone(),
            AppError::Unauthorized(AuthFailure::MissingToken) => "No token provided".to_string(),
            AppError::Unauthorized(AuthFailure::BadScheme) => {
                "Authorization header must use the Bearer scheme".to_string()
            }
            AppError::Unauthorized(AuthFailure::Expired) => "Token expired".to_string(),
            AppError::Unauthorized(AuthFailure::Malformed) => "Invalid token".to_string(),
            AppError::Forbidden => "Access denied".to_string(),
            AppError::RouteNotFound => "Route not found".to_string(),
            AppError::RateLimited { message, .. } => (*message).to_string(),
            AppError::UpstreamUnavailable { .. } => "Service unavailable".to_string(),
            AppError::Upstream { status, .. } => status
                .canonical_reason()
                .unwrap_or("Upstream error")
                .to_string(),
            AppError::Application { message, .. } => message.clone(),
            AppError::Internal { .. } | AppError::Config { .. } => {
                "Internal Server Error".to_string()
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Duplicate { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidFormat { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::RouteNotFound => StatusCode::NOT_FOUND,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            AppError::Upstream { status, .. } => *status,
            AppError::Application { status, .. } => *status,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn validation(fields: Vec<FieldError>) -> Self {
        Self::Validation {
            message: "Validation failed".to_string(),
            fields,
        }
    }

    pub fn duplicate(detail: impl Into<String>) -> Self {
        Self::Duplicate {
            detail: detail.into(),
        }
    }

    pub fn invalid_format(detail: impl Into<String>) -> Self {
        Self::InvalidFormat {
            detail: detail.into(),
        }
    }

    pub fn unauthorized(failure: AuthFailure) -> Self {
        Self::Unauthorized(failure)
    }

    pub fn application(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Application {
            status,
            message: message.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    fn envelope(&self, expose_diagnostics: bool) -> ErrorEnvelope {
        let errors = match self {
            AppError::Validation { fields, .. } if !fields.is_empty() => Some(fields.clone()),
            _ => None,
        };

        ErrorEnvelope {
            success: false,
            message: self.message(),
            errors,
            trace: expose_diagnostics.then(|| self.to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        let trace_id = trace_ctx::trace_id();

        if status.is_server_error() {
            error!(code = %self.code(), trace_id = %trace_id, error = %self, "request failed");
        } else {
            debug!(code = %self.code(), trace_id = %trace_id, error = %self, "request rejected");
        }

        let mut builder = HttpResponse::build(status);
        builder.insert_header(("x-trace-id", trace_id));

        match self {
            // Downstream bodies are relayed verbatim.
            AppError::Upstream {
                body, content_type, ..
            } => {
                builder.content_type(
                    content_type
                        .as_deref()
                        .unwrap_or("application/json")
                        .to_string(),
                );
                builder.body(body.clone())
            }
            AppError::RateLimited { retry_after, .. } => {
                let secs = retry_after_secs(*retry_after);
                if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                    builder.insert_header((header::RETRY_AFTER, value));
                }
                builder.json(self.envelope(trace_ctx::diagnostics_enabled()))
            }
            _ => builder.json(self.envelope(trace_ctx::diagnostics_enabled())),
        }
    }
}

/// Whole seconds, rounded up, never below one.
pub fn retry_after_secs(remaining: Duration) -> u64 {
    let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    secs.max(1)
}

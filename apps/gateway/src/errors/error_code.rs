//! Error codes for the gateway.
//!
//! Every failure the gateway produces carries one of these codes in its log
//! line. Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE.

use core::fmt;

/// Centralized error codes for the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & Authorization
    /// No Authorization header present
    UnauthorizedMissingToken,
    /// Authorization header without the Bearer scheme
    UnauthorizedBadScheme,
    /// Token signature or structure invalid
    UnauthorizedInvalidToken,
    /// Token past its expiry
    UnauthorizedExpiredToken,
    /// Authenticated but not allowed
    Forbidden,

    // Request Validation
    /// Field-level validation failure
    ValidationError,
    /// Duplicate key in the request payload
    DuplicateField,
    /// Malformed body or parameter
    InvalidFormat,

    // Routing
    /// No route for method + path
    RouteNotFound,

    // Throttling
    /// Too many requests in the current window
    RateLimited,

    // Downstream
    /// No response received from a collaborator
    UpstreamUnavailable,
    /// Collaborator answered with an error status
    UpstreamError,
    /// Collaborator error normalized by a local handler
    ApplicationError,

    // System Errors
    /// Internal server error
    Internal,
    /// Configuration error
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical string representation of this error code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnauthorizedMissingToken => "UNAUTHORIZED_MISSING_TOKEN",
            Self::UnauthorizedBadScheme => "UNAUTHORIZED_BAD_SCHEME",
            Self::UnauthorizedInvalidToken => "UNAUTHORIZED_INVALID_TOKEN",
            Self::UnauthorizedExpiredToken => "UNAUTHORIZED_EXPIRED_TOKEN",
            Self::Forbidden => "FORBIDDEN",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::DuplicateField => "DUPLICATE_FIELD",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::RouteNotFound => "ROUTE_NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::ApplicationError => "APPLICATION_ERROR",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }

    /// All codes, in declaration order.
    pub const ALL: &'static [ErrorCode] = &[
        Self::UnauthorizedMissingToken,
        Self::UnauthorizedBadScheme,
        Self::UnauthorizedInvalidToken,
        Self::UnauthorizedExpiredToken,
        Self::Forbidden,
        Self::ValidationError,
        Self::DuplicateField,
        Self::InvalidFormat,
        Self::RouteNotFound,
        Self::RateLimited,
        Self::UpstreamUnavailable,
        Self::UpstreamError,
        Self::ApplicationError,
        Self::Internal,
        Self::ConfigError,
    ];
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

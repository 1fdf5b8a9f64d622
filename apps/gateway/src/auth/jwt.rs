use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::auth::claims::{IdentityClaim, Subject};
use crate::error::{AppError, AuthFailure};
use crate::state::security_config::SecurityConfig;

/// Why a presented token could not be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token malformed or signature invalid")]
    Malformed,
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AppError::unauthorized(AuthFailure::Expired),
            TokenError::Malformed => AppError::unauthorized(AuthFailure::Malformed),
        }
    }
}

fn epoch_secs(now: SystemTime) -> Result<i64, AppError> {
    now.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .map_err(|_| AppError::internal("system clock is before the Unix epoch"))
}

/// Issue a HS256 token for `subject` using the configured TTL.
pub fn issue_token(
    subject: &Subject,
    now: SystemTime,
    security: &SecurityConfig,
) -> Result<String, AppError> {
    issue_token_with_ttl(subject, security.token_ttl, now, security)
}

/// Issue a HS256 token for `subject` that expires `ttl` after `now`.
pub fn issue_token_with_ttl(
    subject: &Subject,
    ttl: Duration,
    now: SystemTime,
    security: &SecurityConfig,
) -> Result<String, AppError> {
    if security.jwt_secret.is_empty() {
        return Err(AppError::config("JWT secret is empty"));
    }

    let iat = epoch_secs(now)?;
    let exp = i64::try_from(ttl.as_secs())
        .ok()
        .and_then(|secs| iat.checked_add(secs))
        .ok_or_else(|| AppError::config(format!("token lifetime {ttl:?} is out of range")))?;
    let claims = IdentityClaim {
        sub: subject.id.clone(),
        email: subject.email.clone(),
        name: subject.name.clone(),
        role: subject.role,
        iat,
        exp,
    };

    encode(
        &Header::new(security.algorithm),
        &claims,
        &EncodingKey::from_secret(&security.jwt_secret),
    )
    .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
}

/// Verify a token against the current wall clock.
pub fn verify_token(token: &str, security: &SecurityConfig) -> Result<IdentityClaim, TokenError> {
    verify_token_at(token, security, SystemTime::now())
}

/// Verify a token as of `now`.
///
/// The signature check is delegated to `jsonwebtoken` (constant-time HMAC
/// comparison, algorithm pinned to the configured one). Expiry is checked
/// here against `now` with no leeway: a token is expired once `now >= exp`.
pub fn verify_token_at(
    token: &str,
    security: &SecurityConfig,
    now: SystemTime,
) -> Result<IdentityClaim, TokenError> {
    let mut validation = Validation::new(security.algorithm);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<IdentityClaim>(
        token,
        &DecodingKey::from_secret(&security.jwt_secret),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| TokenError::Malformed)?;

    let now = now
        .duration_since(UNIX_EPOCH)
        .map_err(|_| TokenError::Malformed)?
        .as_secs() as i64;
    if now >= claims.exp {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

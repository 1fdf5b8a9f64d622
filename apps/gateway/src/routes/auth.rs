//! Register, login and verify.
//!
//! Credentials are checked by the user service; the gateway validates the
//! input shape, normalizes the email and issues the session token.

use std::time::SystemTime;

use actix_web::{web, HttpResponse};
use lazy_regex::regex_is_match;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{issue_token, IdentityClaim};
use crate::downstream::{Credentials, Registration, UserRecord};
use crate::error::{AppError, FieldError};
use crate::extractors::{Identity, ValidatedJson};
use crate::state::app_state::AppState;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: &'static str,
    pub token: String,
    pub user: UserRecord,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub user: IdentityClaim,
}

/// Trimmed and lowercased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    regex_is_match!(r"^[^\s@]+@[^\s@]+\.[^\s@]+$", email)
}

impl RegisterRequest {
    /// Normalized registration, or every field problem found.
    pub fn validate(&self) -> Result<Registration, AppError> {
        let mut errors = Vec::new();
        let email = normalize_email(&self.email);
        let name = self.name.trim();

        if !is_valid_email(&email) {
            errors.push(FieldError::new("email", "Please provide a valid email"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 6 characters",
            ));
        }
        if name.is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }

        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }
        Ok(Registration {
            name: name.to_string(),
            email,
            password: self.password.clone(),
        })
    }
}

impl LoginRequest {
    pub fn validate(&self) -> Result<Credentials, AppError> {
        let mut errors = Vec::new();
        let email = normalize_email(&self.email);

        if !is_valid_email(&email) {
            errors.push(FieldError::new("email", "Please provide a valid email"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }

        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }
        Ok(Credentials {
            email,
            password: self.password.clone(),
        })
    }
}

fn session(
    user: UserRecord,
    message: &'static str,
    state: &AppState,
) -> Result<AuthResponse, AppError> {
    let token = issue_token(&user.subject(), SystemTime::now(), state.security())?;
    Ok(AuthResponse {
        success: true,
        message,
        token,
        user,
    })
}

pub async fn register(
    body: ValidatedJson<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let registration = body.validate()?;
    let user = state.identity.register(&registration).await?;
    info!(user_id = %user.id, "user registered");

    let response = session(user, "User registered successfully", &state)?;
    Ok(HttpResponse::Created().json(response))
}

pub async fn login(
    body: ValidatedJson<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let credentials = body.validate()?;
    let user = state.identity.login(&credentials).await?;

    let response = session(user, "Login successful", &state)?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn verify(identity: Identity) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(VerifyResponse {
        success: true,
        user: identity.0,
    }))
}

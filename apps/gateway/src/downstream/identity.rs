//! Credential checks delegated to the user service.

use actix_web::http::Method;
use serde::{Deserialize, Deserializer, Serialize};

use super::{DownstreamClient, DownstreamRequest, Service};
use crate::auth::{Role, Subject};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// User as returned by the user service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(alias = "_id", deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl UserRecord {
    pub fn subject(&self) -> Subject {
        Subject {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

#[derive(Deserialize)]
struct UpstreamMessage {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IdentityClient {
    downstream: DownstreamClient,
}

impl IdentityClient {
    pub fn new(downstream: DownstreamClient) -> Self {
        Self { downstream }
    }

    pub async fn register(&self, registration: &Registration) -> Result<UserRecord, AppError> {
        self.call("/api/users/register", registration, "Registration failed")
            .await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<UserRecord, AppError> {
        self.call("/api/users/login", credentials, "Login failed")
            .await
    }

    async fn call<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
        fallback: &str,
    ) -> Result<UserRecord, AppError> {
        let req = DownstreamRequest::new(Method::POST, Service::Users, path).json(payload)?;
        match self.downstream.forward(req).await {
            Ok(resp) => resp.json(),
            Err(err) => Err(normalize_rejection(err, fallback)),
        }
    }
}

/// User-service rejections keep their status but get the gateway envelope.
fn normalize_rejection(err: AppError, fallback: &str) -> AppError {
    match err {
        AppError::Upstream { status, body, .. } => {
            let message = serde_json::from_slice::<UpstreamMessage>(&body)
                .ok()
                .and_then(|m| m.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string());
            AppError::application(status, message)
        }
        other => other,
    }
}

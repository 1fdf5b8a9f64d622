use std::ops::{Deref, DerefMut};

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest};
use bytes::BytesMut;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Error as JsonError;
use tracing::{debug, warn};

use crate::error::AppError;

/// Largest JSON body accepted by local handlers.
pub const MAX_JSON_BODY: usize = 256 * 1024;

/// JSON extractor whose parse failures become gateway error envelopes.
///
/// Malformed JSON and wrong field types map to `InvalidFormat` (400); a
/// repeated key maps to `Duplicate` (400); an oversize body maps to 413.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for ValidatedJson<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + 'static,
{
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let mut payload = payload.take();
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("")
            .to_string();

        Box::pin(async move {
            let mut body = BytesMut::new();
            while let Some(chunk) = payload.next().await {
                let chunk = chunk.map_err(|e| {
                    warn!(error = %e, "Failed to read request body chunk");
                    AppError::invalid_format("Failed to read request body")
                })?;
                if body.len() + chunk.len() > MAX_JSON_BODY {
                    return Err(AppError::application(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        "Request body too large",
                    ));
                }
                body.extend_from_slice(&chunk);
            }

            let parsed = serde_json::from_slice::<T>(&body).map_err(|e| {
                debug!(
                    error = %e,
                    content_type = %content_type,
                    body_size = body.len(),
                    "JSON parsing failed"
                );
                classify_json_error(&e)
            })?;

            Ok(ValidatedJson(parsed))
        })
    }
}

/// Map a serde_json error to a client-safe error.
fn classify_json_error(error: &JsonError) -> AppError {
    use serde_json::error::Category;

    match error.classify() {
        Category::Data if error.to_string().starts_with("duplicate field") => {
            AppError::duplicate(error.to_string())
        }
        Category::Syntax => AppError::invalid_format(format!(
            "Invalid JSON at line {}",
            error.line()
        )),
        Category::Eof => AppError::invalid_format("Invalid JSON: unexpected end of input"),
        Category::Data => AppError::invalid_format("Invalid JSON: wrong types for one or more fields"),
        Category::Io => AppError::invalid_format("Invalid JSON: I/O error while reading body"),
    }
}

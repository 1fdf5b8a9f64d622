//! Assertions for the gateway's JSON error envelope.
//!
//! Mirrors the wire shape without depending on gateway types, so a change to
//! the envelope breaks these helpers the same way it would break a client.

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::HeaderMap;
use actix_web::http::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FieldErrorLike {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EnvelopeLike {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub errors: Option<Vec<FieldErrorLike>>,
    #[serde(default)]
    pub trace: Option<String>,
}

impl EnvelopeLike {
    pub fn field_names(&self) -> Vec<&str> {
        self.errors
            .iter()
            .flatten()
            .map(|e| e.field.as_str())
            .collect()
    }
}

/// Assert status, `success: false`, the message and a non-empty `x-trace-id`.
/// Returns the parsed envelope for further checks.
pub fn assert_envelope_from_parts(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    expected_status: StatusCode,
    expected_message: &str,
) -> EnvelopeLike {
    assert_eq!(status, expected_status, "unexpected status");

    let envelope: EnvelopeLike = serde_json::from_slice(body).unwrap_or_else(|e| {
        panic!(
            "body is not an error envelope ({e}): {}",
            String::from_utf8_lossy(body)
        )
    });

    assert!(!envelope.success, "error envelope must carry success=false");
    assert_eq!(envelope.message, expected_message);

    let trace_id = headers
        .get("x-trace-id")
        .expect("x-trace-id header should be present")
        .to_str()
        .expect("x-trace-id header should be valid UTF-8");
    assert!(!trace_id.is_empty(), "x-trace-id should not be empty");

    envelope
}

/// Same as [`assert_envelope_from_parts`], reading the body of a test response.
pub async fn assert_envelope<B: MessageBody>(
    resp: ServiceResponse<B>,
    expected_status: StatusCode,
    expected_message: &str,
) -> EnvelopeLike {
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = actix_web::test::read_body(resp).await;
    assert_envelope_from_parts(status, &headers, &body, expected_status, expected_message)
}

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use super::table::ForwardTarget;
use crate::downstream::DownstreamRequest;
use crate::error::{AppError, AuthFailure};
use crate::extractors::MaybeIdentity;
use crate::state::app_state::AppState;

/// Characters escaped in a path segment (RFC 3986 `pchar` complement).
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'\\')
    .add(b'^')
    .add(b'|');

/// Relay one request to the target collaborator.
pub async fn forward(
    target: &'static ForwardTarget,
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
    identity: MaybeIdentity,
) -> Result<HttpResponse, AppError> {
    let needs_identity = target.min_role.is_some() || !target.identity_headers.is_empty();
    let claim = match identity.claim() {
        Some(claim) => Some(claim),
        None if needs_identity => return Err(AppError::unauthorized(AuthFailure::MissingToken)),
        None => None,
    };

    if let (Some(min_role), Some(claim)) = (target.min_role, claim) {
        if claim.role < min_role {
            return Err(AppError::Forbidden);
        }
    }

    let path = upstream_path(target.upstream_path, &req)?;
    let query = allowed_query(req.query_string(), target.query_params);

    let mut downstream = DownstreamRequest::new(req.method().clone(), target.service, path)
        .with_query(query);
    if let Some(claim) = claim {
        downstream = downstream.with_identity(claim, target.identity_headers);
    }
    if !body.is_empty() {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        downstream = downstream.with_body(body, content_type);
    }

    let response = state.downstream.forward(downstream).await?;
    Ok(response.into_http_response(target.success_status))
}

/// Fill `{name}` segments of `template` from the matched route. Values may
/// still carry escapes from the inbound URL; they are decoded once and then
/// encoded for the downstream path.
pub fn upstream_path(template: &str, req: &HttpRequest) -> Result<String, AppError> {
    fill_template(template, |name| req.match_info().get(name).map(str::to_string))
}

fn fill_template<F>(template: &str, lookup: F) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut path = String::with_capacity(template.len());
    for segment in template.split('/').skip(1) {
        path.push('/');
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => {
                let value = lookup(name)
                    .ok_or_else(|| AppError::internal(format!("unbound path parameter '{name}'")))?;
                let value = percent_decode_str(&value)
                    .decode_utf8()
                    .map_err(|_| AppError::invalid_format("Invalid ID format"))?;
                if value.is_empty() || value == "." || value == ".." {
                    return Err(AppError::invalid_format("Invalid ID format"));
                }
                path.extend(utf8_percent_encode(&value, PATH_SEGMENT));
            }
            None => path.push_str(segment),
        }
    }
    Ok(path)
}

/// Keep only allow-listed, non-empty query parameters, in request order.
pub fn allowed_query(query_string: &str, allowed: &[&str]) -> Vec<(String, String)> {
    if allowed.is_empty() || query_string.is_empty() {
        return Vec::new();
    }
    web::Query::<Vec<(String, String)>>::from_query(query_string)
        .map(|q| q.into_inner())
        .unwrap_or_default()
        .into_iter()
        .filter(|(key, value)| !value.is_empty() && allowed.contains(&key.as_str()))
        .collect()
}

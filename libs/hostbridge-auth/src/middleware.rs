//! Axum glue: the authentication middleware and the identity extractor.

use std::sync::Arc;

use axum::{
    body::{Body, HttpBody, to_bytes},
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::AuthError;
use crate::extract::SESSION_TOKEN_HEADER;
use crate::pipeline::Authenticator;
use hostbridge_types::{InboundRequest, VerifiedIdentity};

/// Bodies above this size, or of unknown size, are not inspected for
/// token or hash parameters.
const MAX_BUFFERED_BODY: usize = 256 * 1024;

/// Request extractor for the identity stored by [`authenticate_request`].
///
/// Handlers take `Identity(identity)` as an argument. Rejects with 401
/// when the middleware did not run on this route or was bypassed.
#[derive(Debug, Clone)]
pub struct Identity(pub VerifiedIdentity);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VerifiedIdentity>()
            .cloned()
            .map(Identity)
            .ok_or(AuthError::MissingToken)
    }
}

/// Middleware running the verification pipeline on every request.
///
/// On success the verified identity lands in the request extensions and
/// the freshly minted session token is echoed on the `x-session-token`
/// response header. On failure the pipeline error becomes the JSON
/// response and the handler never runs.
pub async fn authenticate_request(
    State(authenticator): State<Arc<Authenticator>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if authenticator.config().bypass_auth {
        tracing::warn!("Authentication bypass is enabled, request passed through unverified");
        return Ok(next.run(request).await);
    }

    let (inbound, mut request) = snapshot_request(request).await;

    let identity = authenticator.authenticate(&inbound).await?;
    let session_token = identity.session_token.clone();
    request.extensions_mut().insert(identity);

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::try_from(session_token) {
        response.headers_mut().insert(SESSION_TOKEN_HEADER, value);
    }
    Ok(response)
}

/// Captures the request as a framework-neutral snapshot and hands back a
/// request the handler can still consume.
///
/// The body is buffered only when its content type says it may carry
/// parameters (form or JSON) and its size is known up front to fit
/// [`MAX_BUFFERED_BODY`]; buffered bytes are replayed into the returned
/// request. Any other body flows through untouched and contributes no
/// parameters.
async fn snapshot_request(request: Request) -> (InboundRequest, Request) {
    let (parts, body) = request.into_parts();

    let mut inbound = InboundRequest::new(parts.method.as_str(), parts.uri.path());

    if let Some(query) = parts.uri.query() {
        inbound.query = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
    }

    inbound.headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let wants_body = content_type.starts_with("application/x-www-form-urlencoded")
        || content_type.starts_with("application/json");

    // The exact size hint comes from the transport's framing (hyper sets
    // it from Content-Length). Chunked and oversized bodies skip
    // buffering so the handler still receives every byte.
    let fits = body
        .size_hint()
        .exact()
        .is_some_and(|length| length <= MAX_BUFFERED_BODY as u64);

    if !wants_body || !fits {
        return (inbound, Request::from_parts(parts, body));
    }

    match to_bytes(body, MAX_BUFFERED_BODY).await {
        Ok(bytes) => {
            inbound.body_params = parse_body_params(content_type, &bytes);
            (inbound, Request::from_parts(parts, Body::from(bytes)))
        }
        // Reading a body of known, in-cap size only fails on a transport
        // fault; there is nothing left worth replaying.
        Err(_) => (inbound, Request::from_parts(parts, Body::empty())),
    }
}

/// Flattens a form or JSON-object body into the string pairs the
/// canonical form understands. Scalars stringify, arrays flatten one
/// level, nested objects and nulls contribute nothing.
fn parse_body_params(content_type: &str, bytes: &[u8]) -> Vec<(String, String)> {
    if content_type.starts_with("application/x-www-form-urlencoded") {
        return url::form_urlencoded::parse(bytes).into_owned().collect();
    }

    let Ok(serde_json::Value::Object(map)) = serde_json::from_slice(bytes) else {
        return Vec::new();
    };

    let mut params = Vec::new();
    for (key, value) in map {
        match value {
            serde_json::Value::Array(items) => {
                for item in &items {
                    if let Some(item) = scalar_to_string(item) {
                        params.push((key.clone(), item));
                    }
                }
            }
            other => {
                if let Some(value) = scalar_to_string(&other) {
                    params.push((key, value));
                }
            }
        }
    }
    params
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

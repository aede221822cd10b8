//! Canonical request construction and query-string-hash computation.
//!
//! A token's `qsh` claim is the lowercase hex SHA-256 of a canonical
//! rendering of the request it was minted for:
//!
//! ```text
//! METHOD&/path&a=1&b=2,3
//! ```
//!
//! Method uppercased; path relative to the configured base URL, with a
//! leading slash and no trailing slash; query keys sorted codepoint-wise
//! and each key's values sorted then comma-joined, all RFC 3986 encoded.
//! The parameter carrying the token itself never participates in the
//! hash.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use url::Url;

use crate::InboundRequest;

/// Separator between the method, path, and query sections. A literal
/// `&` inside the path is escaped so it cannot collide with this.
const SECTION_SEPARATOR: char = '&';

/// Query parameter that carries the inbound token; excluded from the
/// canonical query.
pub const TOKEN_PARAM: &str = "jwt";

/// Renders the canonical form of a request.
///
/// With `include_body` set, body parameters stand in for the query on
/// POST and PUT requests that have no query string of their own. Hosts
/// use that form when the signed request carried its parameters in a
/// form body.
pub fn canonical_request(request: &InboundRequest, include_body: bool, base_url: &Url) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        canonical_method(request),
        canonical_path(request, base_url),
        canonical_query(effective_params(request, include_body)),
        sep = SECTION_SEPARATOR,
    )
}

/// Lowercase hex SHA-256 of the canonical request.
pub fn query_string_hash(request: &InboundRequest, include_body: bool, base_url: &Url) -> String {
    let canonical = canonical_request(request, include_body, base_url);
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

fn canonical_method(request: &InboundRequest) -> String {
    request.method.to_uppercase()
}

fn canonical_path(request: &InboundRequest, base_url: &Url) -> String {
    // Plain prefix match against the base URL's path, so an integration
    // served under /context sees /context/resource as /resource.
    let base_path = base_url.path();
    let path = request
        .path
        .strip_prefix(base_path)
        .unwrap_or(&request.path);

    if path.is_empty() {
        return "/".to_string();
    }

    let mut path = path.replace(SECTION_SEPARATOR, "%26");

    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}

/// Parameters participating in the hash. Body parameters stand in only
/// when the query is empty on a write-style request.
fn effective_params(request: &InboundRequest, include_body: bool) -> &[(String, String)] {
    let method = request.method.to_uppercase();
    if include_body && request.query.is_empty() && (method == "POST" || method == "PUT") {
        &request.body_params
    } else {
        &request.query
    }
}

fn canonical_query(params: &[(String, String)]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in params {
        if key == TOKEN_PARAM {
            continue;
        }
        grouped.entry(key.as_str()).or_default().push(value.as_str());
    }

    grouped
        .into_iter()
        .map(|(key, mut values)| {
            values.sort_unstable();
            let joined = values
                .iter()
                .map(|value| encode_rfc3986(value))
                .collect::<Vec<_>>()
                .join(",");
            format!("{}={}", encode_rfc3986(key), joined)
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encodes every UTF-8 byte outside the RFC 3986 unreserved
/// set, with uppercase hex digits.
fn encode_rfc3986(value: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => {
                encoded.push('%');
                encoded.push(HEX[(byte >> 4) as usize] as char);
                encoded.push(HEX[(byte & 0x0f) as usize] as char);
            }
        }
    }
    encoded
}

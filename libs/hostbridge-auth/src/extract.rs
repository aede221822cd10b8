//! Locating the inbound token on a request.

use hostbridge_types::{InboundRequest, TOKEN_PARAM};

use crate::error::{AuthError, AuthResult};

/// Authorization scheme tag marking a host platform token.
pub(crate) const AUTH_SCHEME: &str = "JWT ";

/// Legacy query parameter on which previously issued session tokens
/// travel back to us.
pub const SESSION_TOKEN_PARAM: &str = "session_token";

/// Session token header: set on responses when a new token is minted,
/// accepted on requests as the legacy fallback source.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Which source supplied the token. Logged for operational debugging;
/// the token itself never is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenSource {
    QueryParam,
    BodyField,
    AuthorizationHeader,
    LegacyQueryParam,
    LegacyHeader,
}

impl TokenSource {
    fn as_str(&self) -> &'static str {
        match self {
            TokenSource::QueryParam => "query",
            TokenSource::BodyField => "body",
            TokenSource::AuthorizationHeader => "authorization-header",
            TokenSource::LegacyQueryParam => "legacy-query",
            TokenSource::LegacyHeader => "legacy-header",
        }
    }
}

/// Pulls the raw token off a request.
///
/// Priority: the `jwt` query parameter, then a `jwt` body field, then
/// an `Authorization: JWT <token>` header, then the legacy
/// session-token query parameter and header. A token in both query and
/// body is ambiguous and rejected outright rather than guessed at.
/// Empty values count as absent.
pub(crate) fn extract_token(request: &InboundRequest) -> AuthResult<(&str, TokenSource)> {
    let in_query = request.query_param(TOKEN_PARAM).filter(|t| !t.is_empty());
    let in_body = request.body_param(TOKEN_PARAM).filter(|t| !t.is_empty());

    match (in_query, in_body) {
        (Some(_), Some(_)) => return Err(AuthError::AmbiguousToken),
        (Some(token), None) => return found(token, TokenSource::QueryParam),
        (None, Some(token)) => return found(token, TokenSource::BodyField),
        (None, None) => {}
    }

    if let Some(auth) = request.header("authorization")
        && let Some(token) = auth.strip_prefix(AUTH_SCHEME).filter(|t| !t.is_empty())
    {
        return found(token, TokenSource::AuthorizationHeader);
    }

    if let Some(token) = request
        .query_param(SESSION_TOKEN_PARAM)
        .filter(|t| !t.is_empty())
    {
        return found(token, TokenSource::LegacyQueryParam);
    }
    if let Some(token) = request
        .header(SESSION_TOKEN_HEADER)
        .filter(|t| !t.is_empty())
    {
        return found(token, TokenSource::LegacyHeader);
    }

    Err(AuthError::MissingToken)
}

fn found(token: &str, source: TokenSource) -> AuthResult<(&str, TokenSource)> {
    tracing::debug!(source = source.as_str(), "Found inbound token");
    Ok((token, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> InboundRequest {
        InboundRequest::new("GET", "/resource")
    }

    fn with_query(mut req: InboundRequest, key: &str, value: &str) -> InboundRequest {
        req.query.push((key.to_string(), value.to_string()));
        req
    }

    fn with_body(mut req: InboundRequest, key: &str, value: &str) -> InboundRequest {
        req.body_params.push((key.to_string(), value.to_string()));
        req
    }

    fn with_header(mut req: InboundRequest, key: &str, value: &str) -> InboundRequest {
        req.headers.push((key.to_string(), value.to_string()));
        req
    }

    #[test]
    fn test_query_param_wins() {
        let req = with_header(
            with_query(request(), "jwt", "tok-query"),
            "authorization",
            "JWT tok-header",
        );

        let (token, source) = extract_token(&req).unwrap();
        assert_eq!(token, "tok-query");
        assert_eq!(source, TokenSource::QueryParam);
    }

    #[test]
    fn test_body_field_used_without_query() {
        let req = with_body(request(), "jwt", "tok-body");

        let (token, source) = extract_token(&req).unwrap();
        assert_eq!(token, "tok-body");
        assert_eq!(source, TokenSource::BodyField);
    }

    #[test]
    fn test_token_in_query_and_body_is_ambiguous() {
        let req = with_body(with_query(request(), "jwt", "a"), "jwt", "b");

        assert!(matches!(
            extract_token(&req),
            Err(AuthError::AmbiguousToken)
        ));
    }

    #[test]
    fn test_authorization_header_with_scheme() {
        let req = with_header(request(), "Authorization", "JWT tok-header");

        let (token, source) = extract_token(&req).unwrap();
        assert_eq!(token, "tok-header");
        assert_eq!(source, TokenSource::AuthorizationHeader);
    }

    #[test]
    fn test_other_authorization_schemes_are_ignored() {
        let req = with_header(request(), "authorization", "Bearer tok");

        assert!(matches!(extract_token(&req), Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_legacy_query_param() {
        let req = with_query(request(), "session_token", "tok-legacy");

        let (token, source) = extract_token(&req).unwrap();
        assert_eq!(token, "tok-legacy");
        assert_eq!(source, TokenSource::LegacyQueryParam);
    }

    #[test]
    fn test_legacy_header() {
        let req = with_header(request(), "X-Session-Token", "tok-legacy");

        let (token, source) = extract_token(&req).unwrap();
        assert_eq!(token, "tok-legacy");
        assert_eq!(source, TokenSource::LegacyHeader);
    }

    #[test]
    fn test_legacy_query_preferred_over_legacy_header() {
        let req = with_header(
            with_query(request(), "session_token", "tok-query"),
            "x-session-token",
            "tok-header",
        );

        let (token, source) = extract_token(&req).unwrap();
        assert_eq!(token, "tok-query");
        assert_eq!(source, TokenSource::LegacyQueryParam);
    }

    #[test]
    fn test_no_token_anywhere() {
        assert!(matches!(
            extract_token(&request()),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn test_empty_values_count_as_absent() {
        let req = with_header(
            with_query(request(), "jwt", ""),
            "authorization",
            "JWT tok-header",
        );

        let (token, source) = extract_token(&req).unwrap();
        assert_eq!(token, "tok-header");
        assert_eq!(source, TokenSource::AuthorizationHeader);
    }
}

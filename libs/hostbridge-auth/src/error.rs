use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use hostbridge_types::{ClientKey, TokenError};

/// Authentication failures. All of them are terminal for the request;
/// nothing is retried, the caller has to re-authenticate.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token in any extraction source.
    #[error("Could not find an authentication token on the request")]
    MissingToken,

    /// A token arrived in both the query string and the body. Refusing
    /// to guess; reported under the same wire code as `MissingToken`.
    #[error("Authentication token present in both query string and body")]
    AmbiguousToken,

    /// Unverified decode failed: the token is garbage before any secret
    /// enters the picture.
    #[error("Invalid token: {0}")]
    Decode(TokenError),

    /// Decoded claims carry no issuer.
    #[error("Token claims did not contain an issuer")]
    MissingIssuer,

    /// The secret store has no entry for the derived client key.
    #[error("No shared secret registered for client {0}")]
    UnknownClient(ClientKey),

    /// Decode with the resolved secret failed, usually a signature
    /// mismatch.
    #[error("Token rejected for the registered client: {0}")]
    InvalidSignature(TokenError),

    /// The `exp` claim is at or past the current time.
    #[error("Authentication token has expired; re-authenticate to continue")]
    Expired,

    /// Both request-hash comparisons failed. Carries the body-excluded
    /// computation's diagnostics, the more common failure of the two.
    #[error("Query hash mismatch: received {received} but computed {expected} over {canonical}")]
    QshMismatch {
        received: String,
        expected: String,
        canonical: String,
    },

    /// The secret store itself failed. Distinct from `UnknownClient`,
    /// which is an answer, not a fault.
    #[error("Secret resolution failed: {0}")]
    Resolver(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Minting the session token failed.
    #[error("Session token issuance failed: {0}")]
    Issue(TokenError),
}

/// Wire codes for the JSON error body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    MissingToken,
    DecodeError,
    MissingIssuer,
    UnknownClient,
    InvalidSignature,
    Expired,
    QshMismatch,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingToken => "MISSING_TOKEN",
            ErrorCode::DecodeError => "DECODE_ERROR",
            ErrorCode::MissingIssuer => "MISSING_ISSUER",
            ErrorCode::UnknownClient => "UNKNOWN_CLIENT",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::Expired => "EXPIRED",
            ErrorCode::QshMismatch => "QSH_MISMATCH",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl AuthError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthError::MissingToken | AuthError::AmbiguousToken => ErrorCode::MissingToken,
            AuthError::Decode(_) => ErrorCode::DecodeError,
            AuthError::MissingIssuer => ErrorCode::MissingIssuer,
            AuthError::UnknownClient(_) => ErrorCode::UnknownClient,
            AuthError::InvalidSignature(_) => ErrorCode::InvalidSignature,
            AuthError::Expired => ErrorCode::Expired,
            AuthError::QshMismatch { .. } => ErrorCode::QshMismatch,
            AuthError::Resolver(_) | AuthError::Issue(_) => ErrorCode::InternalError,
        }
    }

    /// HTTP status: 400 for a token the registered secret rejects, 500
    /// for infrastructure faults, 401 for everything else.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            AuthError::Resolver(_) | AuthError::Issue(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Rejections are routine; only infrastructure faults are loud.
        if self.status().is_server_error() {
            tracing::error!(error = ?self, "Authentication infrastructure failure");
        } else {
            tracing::debug!(
                error = ?self,
                code = self.code().as_str(),
                "Authentication rejected"
            );
        }

        let body = serde_json::json!({
            "code": self.code().as_str(),
            "msg": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_code_mapping() {
        assert_eq!(AuthError::MissingToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::MissingToken.code(), ErrorCode::MissingToken);

        assert_eq!(AuthError::AmbiguousToken.code(), ErrorCode::MissingToken);
        assert_eq!(AuthError::AmbiguousToken.status(), StatusCode::UNAUTHORIZED);

        let invalid = AuthError::InvalidSignature(hostbridge_types::TokenError::BadSignature);
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.code(), ErrorCode::InvalidSignature);

        let resolver = AuthError::Resolver("backend down".into());
        assert_eq!(resolver.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resolver.code(), ErrorCode::InternalError);
    }

    #[tokio::test]
    async fn test_error_body_carries_code_and_msg() {
        let response = AuthError::Expired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["code"], "EXPIRED");
        assert!(body["msg"].as_str().unwrap().contains("expired"));
    }
}

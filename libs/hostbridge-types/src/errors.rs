use thiserror::Error;

/// Token codec errors.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token could not be parsed at all: wrong segment count, bad
    /// base64, claims that do not match the expected shape, or an
    /// algorithm this codec does not handle.
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// The signature did not verify against the supplied secret.
    #[error("Signature verification failed")]
    BadSignature,

    /// Claim serialization or signing failed while producing a token.
    #[error("Token encoding failed: {0}")]
    Encode(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

    #[test]
    fn test_garbage_token_maps_to_malformed() {
        let err = decode::<serde_json::Value>(
            "not-a-token",
            &DecodingKey::from_secret(b"k"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap_err();

        assert!(matches!(TokenError::from(err), TokenError::Malformed(_)));
    }

    #[test]
    fn test_wrong_secret_maps_to_bad_signature() {
        let claims = serde_json::json!({ "exp": 4102444800i64 });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret-a"),
        )
        .unwrap();

        let err = decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(b"secret-b"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap_err();

        assert!(matches!(TokenError::from(err), TokenError::BadSignature));
    }
}

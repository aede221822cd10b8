use secrecy::SecretString;
use time::OffsetDateTime;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use hostbridge_types::{ClientKey, TokenClaims, TokenCodec};

/// Mints the short-lived session token reissued after every successful
/// verification.
///
/// Issued by this integration (`iss` = integration key), scoped to the
/// verified tenant (`aud` = [client key]), carrying the caller's `sub`
/// forward, signed with the same tenant secret. The verified `context`
/// is copied along so follow-up requests keep it.
pub(crate) fn issue_session_token(
    config: &AuthConfig,
    codec: &dyn TokenCodec,
    verified: &TokenClaims,
    client_key: &ClientKey,
    secret: &SecretString,
) -> AuthResult<String> {
    let now = OffsetDateTime::now_utc();
    let expiry = now + config.max_token_age;

    let claims = TokenClaims {
        iss: Some(config.integration_key.clone()),
        aud: Some(vec![client_key.to_string()]),
        sub: verified.sub.clone(),
        iat: Some(now.unix_timestamp()),
        exp: Some(expiry.unix_timestamp()),
        qsh: None,
        context: verified.context.clone(),
    };

    codec.encode(&claims, secret).map_err(AuthError::Issue)
}

//! The verification pipeline.

use std::sync::Arc;

use secrecy::SecretString;
use time::OffsetDateTime;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::extract::extract_token;
use crate::resolver::SecretResolver;
use crate::session::issue_session_token;
use hostbridge_types::{
    ClientKey, HmacTokenCodec, InboundRequest, TokenClaims, TokenCodec, VerifiedIdentity,
};

/// Runs the verification gates over inbound requests.
///
/// Gates run strictly in order: extract the token, decode it
/// unverified, resolve the tenant and its shared secret, verify the
/// signature, check expiry, check the request-binding hash, then mint a
/// session token. The first failing gate ends the request. The secret
/// lookup is the pipeline's only await point.
pub struct Authenticator {
    config: AuthConfig,
    codec: Arc<dyn TokenCodec>,
    resolver: Arc<dyn SecretResolver>,
}

impl Authenticator {
    /// Authenticator with the default HMAC-SHA256 codec.
    pub fn new(config: AuthConfig, resolver: Arc<dyn SecretResolver>) -> Self {
        Self::with_codec(config, Arc::new(HmacTokenCodec), resolver)
    }

    /// Authenticator with a substituted token codec.
    pub fn with_codec(
        config: AuthConfig,
        codec: Arc<dyn TokenCodec>,
        resolver: Arc<dyn SecretResolver>,
    ) -> Self {
        Self {
            config,
            codec,
            resolver,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Verifies one request end to end and returns the identity to hand
    /// downstream.
    ///
    /// Expiry is compared against UTC now with no clock-skew leeway: a
    /// token whose `exp` equals the current second is already rejected.
    pub async fn authenticate(&self, request: &InboundRequest) -> AuthResult<VerifiedIdentity> {
        // 1. Locate the token.
        let (token, _source) = extract_token(request)?;

        // 2. Decode without verification to learn who claims to have
        //    signed it. Nothing here is trusted yet.
        let peek_secret = SecretString::new("".into());
        let unverified = self
            .codec
            .decode(token, &peek_secret, false)
            .map_err(AuthError::Decode)?;

        // 3. Derive the tenant key; the secret lookup is keyed by it.
        if unverified.issuer().is_none() {
            return Err(AuthError::MissingIssuer);
        }
        let client_key = unverified.client_key().ok_or(AuthError::MissingIssuer)?;

        // 4. Fetch the tenant's shared secret.
        let secret = self
            .resolver
            .resolve_secret(&client_key)
            .await?
            .ok_or_else(|| AuthError::UnknownClient(client_key.clone()))?;

        // 5. Re-decode with the secret, this time verifying the
        //    signature. Only these claims are trusted.
        let verified = self
            .codec
            .decode(token, &secret, true)
            .map_err(AuthError::InvalidSignature)?;

        // 6. Expiry.
        let now = OffsetDateTime::now_utc().unix_timestamp();
        if let Some(exp) = verified.exp
            && now >= exp
        {
            return Err(AuthError::Expired);
        }

        // 7. Request-binding hash, unless disabled or not claimed.
        if !self.config.skip_qsh_verification
            && let Some(claimed) = verified.qsh.as_deref()
        {
            self.check_qsh(request, claimed)?;
        }

        // 8. Mint the session token and assemble the identity.
        let session_token = issue_session_token(
            &self.config,
            self.codec.as_ref(),
            &verified,
            &client_key,
            &secret,
        )?;

        let identity = build_identity(&self.config, &verified, client_key, session_token);
        tracing::debug!(client_key = %identity.client_key, "Request authenticated");
        Ok(identity)
    }

    /// Two-attempt hash comparison: the body-excluded form first, then
    /// the body-included form used by write-style requests. On a
    /// mismatch the error reports the first computation's diagnostics
    /// even when both ran; the body-excluded case is the common one and
    /// keeps the usual GET diagnosis self-consistent.
    fn check_qsh(&self, request: &InboundRequest, claimed: &str) -> AuthResult<()> {
        let base_url = &self.config.base_url;

        let expected = self.codec.query_string_hash(request, false, base_url);
        if claimed == expected {
            return Ok(());
        }

        let expected_with_body = self.codec.query_string_hash(request, true, base_url);
        if claimed == expected_with_body {
            tracing::debug!("Query hash matched the body-included form");
            return Ok(());
        }

        let canonical = self.codec.canonical_request(request, false, base_url);
        tracing::debug!(
            %claimed,
            %expected,
            %expected_with_body,
            %canonical,
            "Query hash mismatch"
        );
        Err(AuthError::QshMismatch {
            received: claimed.to_string(),
            expected,
            canonical,
        })
    }
}

fn build_identity(
    config: &AuthConfig,
    verified: &TokenClaims,
    client_key: ClientKey,
    session_token: String,
) -> VerifiedIdentity {
    let context = verified.context.clone();
    let context_user = context.as_ref().and_then(|ctx| ctx.user.as_ref());

    // `context.user.accountId` wins when present; otherwise `sub` names
    // the account. The legacy user key only ever comes from the context.
    let (user_account_id, user_key) = match context_user {
        Some(user) => (
            user.account_id.clone().or_else(|| verified.sub.clone()),
            user.user_key.clone(),
        ),
        None => (verified.sub.clone(), None),
    };

    VerifiedIdentity {
        client_key,
        host_base_url: config.base_url.clone(),
        session_token,
        user_account_id,
        user_key,
        context,
    }
}

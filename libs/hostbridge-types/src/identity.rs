use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::TokenContext;

/// Tenant identifier derived from a token's audience or issuer claim.
///
/// Keys the shared-secret lookup. Derived fresh for every request and
/// never stored by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientKey(String);

impl ClientKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ClientKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Output of a successful authentication, handed to the downstream
/// handler. Everything in here has passed signature and expiry checks.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// Tenant the request was verified against.
    pub client_key: ClientKey,

    /// Base URL of the host installation, taken from configuration.
    pub host_base_url: Url,

    /// Freshly minted session token. The HTTP adapter also sets this on
    /// a response header so the caller can use it for follow-up requests.
    pub session_token: String,

    /// Account identifier: `context.user.accountId` when present,
    /// otherwise the verified `sub` claim.
    pub user_account_id: Option<String>,

    /// Legacy user key, present only when supplied via `context.user`.
    pub user_key: Option<String>,

    /// Context claim copied verbatim from the verified token.
    pub context: Option<TokenContext>,
}

use time::Duration;
use url::Url;

/// Static configuration for the verification pipeline.
///
/// Injected once at construction. Nothing in here is re-read from the
/// process environment while requests flow.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// This integration's own key, used as the issuer of the session
    /// tokens it mints.
    pub integration_key: String,

    /// Base URL the host installation serves this integration under.
    /// Its path prefix is stripped when canonicalizing request paths
    /// for hash checks.
    pub base_url: Url,

    /// Maximum age of issued session tokens.
    pub max_token_age: Duration,

    /// Skips the request-binding hash check entirely.
    pub skip_qsh_verification: bool,

    /// Lets every request through without any verification, no identity
    /// attached. Local development only.
    pub bypass_auth: bool,
}

impl AuthConfig {
    /// Default lifetime of issued session tokens.
    pub const DEFAULT_MAX_TOKEN_AGE: Duration = Duration::minutes(15);

    pub fn new(integration_key: impl Into<String>, base_url: Url) -> Self {
        Self {
            integration_key: integration_key.into(),
            base_url,
            max_token_age: Self::DEFAULT_MAX_TOKEN_AGE,
            skip_qsh_verification: false,
            bypass_auth: false,
        }
    }
}

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::AuthResult;
use hostbridge_types::ClientKey;

/// Per-tenant shared-secret lookup.
///
/// This is the pipeline's sole suspension point: implementations may
/// hit a database or a remote store. `Ok(None)` means the tenant is
/// unknown, which is a terminal authentication failure. `Err` means the
/// store itself broke and surfaces as an internal error instead.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve_secret(&self, client_key: &ClientKey) -> AuthResult<Option<SecretString>>;
}

/// In-memory implementation of [`SecretResolver`] for development and
/// tests.
#[derive(Default)]
pub struct MemorySecretResolver {
    secrets: Mutex<HashMap<ClientKey, SecretString>>,
}

impl MemorySecretResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(client_key: impl Into<ClientKey>, secret: &str) -> Self {
        let resolver = Self::new();
        resolver.insert(client_key, secret);
        resolver
    }

    pub fn insert(&self, client_key: impl Into<ClientKey>, secret: &str) {
        self.secrets
            .lock()
            .unwrap()
            .insert(client_key.into(), SecretString::new(secret.into()));
    }
}

#[async_trait]
impl SecretResolver for MemorySecretResolver {
    async fn resolve_secret(&self, client_key: &ClientKey) -> AuthResult<Option<SecretString>> {
        Ok(self.secrets.lock().unwrap().get(client_key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn test_resolves_registered_secret() {
        let resolver = MemorySecretResolver::with_secret("tenant-a", "s3cret");

        let secret = resolver
            .resolve_secret(&ClientKey::new("tenant-a"))
            .await
            .unwrap();
        assert_eq!(secret.unwrap().expose_secret(), "s3cret");
    }

    #[tokio::test]
    async fn test_unknown_client_resolves_to_none() {
        let resolver = MemorySecretResolver::new();

        let secret = resolver
            .resolve_secret(&ClientKey::new("nobody"))
            .await
            .unwrap();
        assert!(secret.is_none());
    }
}

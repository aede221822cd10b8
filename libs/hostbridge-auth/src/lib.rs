//! Request authentication for integrations embedded in a multi-tenant
//! host platform.
//!
//! Hosts sign every request they relay to an installed integration with
//! that installation's shared secret. This crate verifies such requests
//! end to end: token extraction from query, body or headers, an
//! unverified decode to identify the tenant, the secret lookup through a
//! pluggable [`SecretResolver`], signature and expiry verification, the
//! query-string hash binding the token to one specific request, and
//! finally a freshly minted session token the client keeps using.
//! Handlers receive the outcome as a [`VerifiedIdentity`].
//!
//! ```ignore
//! let config = AuthConfig::new("my-integration", base_url);
//! let authenticator = Arc::new(Authenticator::new(config, resolver));
//!
//! let app = Router::new()
//!     .route("/panel", get(panel))
//!     .layer(middleware::from_fn_with_state(
//!         authenticator,
//!         authenticate_request,
//!     ));
//!
//! async fn panel(Identity(identity): Identity) -> impl IntoResponse {
//!     format!("hello {}", identity.client_key)
//! }
//! ```

mod config;
mod error;
mod extract;
mod middleware;
mod pipeline;
mod resolver;
mod session;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult, ErrorCode};
pub use extract::{SESSION_TOKEN_HEADER, SESSION_TOKEN_PARAM};
pub use middleware::{Identity, authenticate_request};
pub use pipeline::Authenticator;
pub use resolver::{MemorySecretResolver, SecretResolver};

pub use hostbridge_types::{
    ClientKey, ContextUser, HmacTokenCodec, InboundRequest, TokenClaims, TokenCodec, TokenContext,
    VerifiedIdentity,
};

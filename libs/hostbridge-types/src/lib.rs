//! Shared types and token primitives for Hostbridge authentication.
//!
//! This crate provides:
//! - Token claim structures (`TokenClaims`, `TokenContext`, `ContextUser`)
//! - Tenant identity types (`ClientKey`, `VerifiedIdentity`)
//! - A framework-neutral request view (`InboundRequest`)
//! - Canonical request construction and query-string-hash computation
//! - The `TokenCodec` capability and its HMAC-SHA256 implementation

mod canonical;
mod claims;
mod codec;
mod errors;
mod identity;
mod request;

pub use canonical::{TOKEN_PARAM, canonical_request, query_string_hash};
pub use claims::{ContextUser, TokenClaims, TokenContext};
pub use codec::{HmacTokenCodec, TokenCodec};
pub use errors::TokenError;
pub use identity::{ClientKey, VerifiedIdentity};
pub use request::InboundRequest;

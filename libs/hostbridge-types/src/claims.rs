use serde::{Deserialize, Deserializer, Serialize};

use crate::ClientKey;

/// Claims carried by host platform tokens and by the session tokens this
/// integration mints itself.
///
/// The shape is closed: every claim the pipeline reads is an explicit
/// field, and a payload whose known fields have the wrong type fails at
/// the decode boundary. Claims outside this set are ignored, since host
/// platforms attach extra claims freely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer: the tenant key on inbound tokens, this integration's own
    /// key on minted session tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience. Hosts send either a single string or an array; both
    /// decode to an array here. Minted tokens always serialize an array.
    #[serde(
        default,
        deserialize_with = "aud_string_or_seq",
        skip_serializing_if = "Option::is_none"
    )]
    pub aud: Option<Vec<String>>,

    /// Subject: the user on whose behalf the request is made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiry (Unix timestamp, seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued at (Unix timestamp, seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Query-string hash binding the token to one specific request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qsh: Option<String>,

    /// Host-supplied context data, copied into reissued session tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<TokenContext>,
}

impl TokenClaims {
    /// Issuer claim, treating an empty string as absent.
    pub fn issuer(&self) -> Option<&str> {
        self.iss.as_deref().filter(|iss| !iss.is_empty())
    }

    /// First audience entry, if any.
    pub fn first_audience(&self) -> Option<&str> {
        self.aud
            .as_deref()
            .and_then(|aud| aud.first())
            .map(String::as_str)
    }

    /// Tenant key for the shared-secret lookup: the first audience entry
    /// when it is non-empty, otherwise the issuer.
    pub fn client_key(&self) -> Option<ClientKey> {
        match self.first_audience().filter(|aud| !aud.is_empty()) {
            Some(aud) => Some(ClientKey::new(aud)),
            None => self.issuer().map(ClientKey::new),
        }
    }
}

/// The `context` claim: a user block plus whatever else the host put
/// there. Unknown keys are kept so reissued tokens round-trip them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenContext {
    /// User block, when the host includes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ContextUser>,

    /// Remaining context keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The `context.user` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextUser {
    /// Account identifier for the acting user.
    #[serde(rename = "accountId", skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Legacy user key, still sent by some hosts.
    #[serde(rename = "userKey", skip_serializing_if = "Option::is_none")]
    pub user_key: Option<String>,

    /// Remaining user keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Accepts the `aud` claim as either a bare string or an array of
/// strings, per common token practice.
fn aud_string_or_seq<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Aud {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Aud>::deserialize(deserializer)? {
        None => None,
        Some(Aud::One(aud)) => Some(vec![aud]),
        Some(Aud::Many(auds)) => Some(auds),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_aud_accepts_string_and_array() {
        let claims: TokenClaims =
            serde_json::from_value(json!({ "iss": "tenant-a", "aud": "one" })).unwrap();
        assert_eq!(claims.aud, Some(vec!["one".to_string()]));

        let claims: TokenClaims =
            serde_json::from_value(json!({ "iss": "tenant-a", "aud": ["one", "two"] })).unwrap();
        assert_eq!(
            claims.aud,
            Some(vec!["one".to_string(), "two".to_string()])
        );
    }

    #[test]
    fn test_aud_wrong_shape_is_rejected() {
        let result = serde_json::from_value::<TokenClaims>(json!({ "iss": "x", "aud": 42 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_top_level_claims_are_ignored() {
        let claims: TokenClaims = serde_json::from_value(json!({
            "iss": "tenant-a",
            "custom": { "deep": true }
        }))
        .unwrap();
        assert_eq!(claims.issuer(), Some("tenant-a"));
    }

    #[test]
    fn test_client_key_prefers_first_audience() {
        let claims: TokenClaims =
            serde_json::from_value(json!({ "iss": "tenant-a", "aud": ["other-key"] })).unwrap();
        assert_eq!(claims.client_key(), Some(ClientKey::new("other-key")));
    }

    #[test]
    fn test_client_key_empty_audience_entry_falls_back_to_issuer() {
        let claims: TokenClaims =
            serde_json::from_value(json!({ "iss": "tenant-a", "aud": [""] })).unwrap();
        assert_eq!(claims.client_key(), Some(ClientKey::new("tenant-a")));
    }

    #[test]
    fn test_client_key_without_audience_uses_issuer() {
        let claims: TokenClaims = serde_json::from_value(json!({ "iss": "tenant-b" })).unwrap();
        assert_eq!(claims.client_key(), Some(ClientKey::new("tenant-b")));
    }

    #[test]
    fn test_empty_issuer_is_treated_as_absent() {
        let claims: TokenClaims = serde_json::from_value(json!({ "iss": "" })).unwrap();
        assert_eq!(claims.issuer(), None);
        assert_eq!(claims.client_key(), None);
    }

    #[test]
    fn test_context_round_trips_unknown_keys() {
        let claims: TokenClaims = serde_json::from_value(json!({
            "iss": "tenant-a",
            "context": {
                "user": { "accountId": "acct-1", "userKey": "legacy", "displayName": "Ada" },
                "issue": { "key": "PROJ-1" }
            }
        }))
        .unwrap();

        let context = claims.context.clone().unwrap();
        let user = context.user.clone().unwrap();
        assert_eq!(user.account_id.as_deref(), Some("acct-1"));
        assert_eq!(user.user_key.as_deref(), Some("legacy"));
        assert_eq!(user.extra["displayName"], json!("Ada"));
        assert_eq!(context.extra["issue"], json!({ "key": "PROJ-1" }));

        // Reserializing keeps everything the host sent.
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["context"]["issue"]["key"], json!("PROJ-1"));
        assert_eq!(value["context"]["user"]["displayName"], json!("Ada"));
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let claims = TokenClaims {
            iss: Some("integration".to_string()),
            ..Default::default()
        };

        let value = serde_json::to_value(&claims).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("iss"));
    }
}

//! Bearer token handling.
//!
//! A [`BearerToken`] wraps the credential sent in the `Authorization`
//! header. When the token is a JWT its claims can be inspected to find out
//! whether it has expired; opaque tokens never expire from the client's
//! point of view.
//!
//! Claims are decoded without verifying the signature. The server remains
//! the authority on whether a token is acceptable; the client only uses the
//! `exp` claim to avoid sending credentials it already knows are stale.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::error::ConfigError;

/// A bearer credential with masked debug output.
///
/// # Example
///
/// ```rust
/// use rest_resource::BearerToken;
///
/// let token = BearerToken::new("opaque-token").unwrap();
/// assert_eq!(format!("{:?}", token), "BearerToken(*****)");
///
/// // Opaque tokens have no payload and never expire
/// assert!(token.payload().is_none());
/// assert!(token.is_valid());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Creates a new bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyBearerToken`] if the token is empty or
    /// only whitespace.
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        let token = token.trim();
        if token.is_empty() {
            return Err(ConfigError::EmptyBearerToken);
        }
        Ok(Self(token.to_string()))
    }

    /// Returns the decoded JWT claims, or `None` for opaque tokens.
    #[must_use]
    pub fn payload(&self) -> Option<Map<String, Value>> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        match decode::<Map<String, Value>>(&self.0, &DecodingKey::from_secret(&[]), &validation) {
            Ok(data) => Some(data.claims),
            Err(error) => {
                tracing::debug!(%error, "bearer token is not a decodable JWT");
                None
            }
        }
    }

    /// Returns the expiry taken from the `exp` claim, if any.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let exp = self.payload()?.get("exp")?.clone();
        let seconds = match exp {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
            _ => return None,
        };
        Utc.timestamp_opt(seconds, 0).single()
    }

    /// Returns `true` if the token carries an `exp` claim in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at().is_some_and(|expires| Utc::now() >= expires)
    }

    /// Returns `true` if the token may be sent.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}

impl AsRef<str> for BearerToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(*****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn jwt(claims: &Value) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(b"server-side-secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_token_is_rejected() {
        assert_eq!(BearerToken::new(""), Err(ConfigError::EmptyBearerToken));
        assert_eq!(BearerToken::new("   "), Err(ConfigError::EmptyBearerToken));
    }

    #[test]
    fn test_debug_masks_token() {
        let token = BearerToken::new("secret-value").unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret-value"));
        assert_eq!(token.as_ref(), "secret-value");
    }

    #[test]
    fn test_payload_decodes_without_signing_key() {
        let token = BearerToken::new(jwt(&json!({"sub": "42", "role": "admin"}))).unwrap();
        let payload = token.payload().unwrap();

        assert_eq!(payload.get("sub"), Some(&json!("42")));
        assert_eq!(payload.get("role"), Some(&json!("admin")));
    }

    #[test]
    fn test_token_without_exp_never_expires() {
        let token = BearerToken::new(jwt(&json!({"sub": "42"}))).unwrap();
        assert!(token.expires_at().is_none());
        assert!(!token.is_expired());
        assert!(token.is_valid());
    }

    #[test]
    fn test_token_with_past_exp_is_expired() {
        let exp = Utc::now().timestamp() - 60;
        let token = BearerToken::new(jwt(&json!({"exp": exp}))).unwrap();

        assert_eq!(token.expires_at().map(|d| d.timestamp()), Some(exp));
        assert!(token.is_expired());
        assert!(!token.is_valid());
    }

    #[test]
    fn test_token_with_future_exp_is_valid() {
        let exp = Utc::now().timestamp() + 3600;
        let token = BearerToken::new(jwt(&json!({"exp": exp}))).unwrap();

        assert!(!token.is_expired());
        assert!(token.is_valid());
    }

    #[test]
    fn test_opaque_token_has_no_payload() {
        let token = BearerToken::new("not.a.jwt").unwrap();
        assert!(token.payload().is_none());
        assert!(token.is_valid());
    }
}

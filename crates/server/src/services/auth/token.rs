//! Stateless bearer tokens (JWT, HS256).
//!
//! Tokens are `base64url(header).base64url(claims).base64url(signature)`
//! where the signature is HMAC-SHA256 over the first two segments. Only
//! `HS256` is accepted.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use ecommerce_store_core::{Role, UserId};

use crate::config::JwtConfig;
use crate::models::{CurrentUser, User};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

/// Errors that can occur while issuing or verifying tokens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("unsupported token algorithm")]
    UnsupportedAlgorithm,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid signing key")]
    InvalidKey,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    pub id: UserId,
    pub roles: Vec<Role>,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            username: claims.sub,
            roles: claims.roles,
        }
    }
}

/// Signs and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    secret: SecretString,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("secret", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl TokenKeys {
    #[must_use]
    pub const fn new(secret: SecretString, ttl_secs: i64) -> Self {
        Self { secret, ttl_secs }
    }

    #[must_use]
    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(config.secret.clone(), config.ttl_secs)
    }

    /// Token lifetime in seconds.
    #[must_use]
    pub const fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for `user`, valid from now for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidKey` if the signing key is unusable.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        self.sign(&Claims {
            sub: user.username.to_string(),
            id: user.id,
            roles: user.roles.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        })
    }

    /// Sign arbitrary claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidKey` if the signing key is unusable.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = Header {
            alg: ALGORITHM.to_owned(),
            typ: "JWT".to_owned(),
        };
        let header = serde_json::to_vec(&header).map_err(|_| TokenError::Malformed)?;
        let payload = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns a `TokenError` describing the first check that failed.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let header: Header = decode_json(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        // Constant-time comparison
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: Claims = decode_json(payload_b64)?;
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::InvalidKey)
    }
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new(SecretString::from("k3Y!9xQz#Lm2@Vb7$Rt5%Wn8^Pc4&Hd6"), 3600)
    }

    fn claims(exp: i64) -> Claims {
        Claims {
            sub: "alice".to_owned(),
            id: UserId::new(5),
            roles: vec![Role::User],
            iat: 1_000,
            exp,
        }
    }

    #[test]
    fn test_sign_then_verify() {
        let keys = keys();
        let token = keys.sign(&claims(2_000)).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(keys.verify_at(&token, 1_500).unwrap(), claims(2_000));
    }

    #[test]
    fn test_expired() {
        let keys = keys();
        let token = keys.sign(&claims(2_000)).unwrap();
        assert_eq!(keys.verify_at(&token, 2_000), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_key() {
        let token = keys().sign(&claims(2_000)).unwrap();
        let other = TokenKeys::new(SecretString::from("another-key-entirely-0123456789ab"), 60);
        assert_eq!(
            other.verify_at(&token, 1_500),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_payload() {
        let keys = keys();
        let token = keys.sign(&claims(2_000)).unwrap();
        let mut admin = claims(2_000);
        admin.roles = vec![Role::Admin];
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&admin).unwrap());

        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert_eq!(
            keys.verify_at(&forged, 1_500),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_rejects_none_algorithm() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims(2_000)).unwrap());
        let token = format!("{header}.{payload}.");
        assert_eq!(
            keys().verify_at(&token, 1_500),
            Err(TokenError::UnsupportedAlgorithm)
        );
    }

    #[test]
    fn test_malformed() {
        let keys = keys();
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.??.**"] {
            assert_eq!(keys.verify_at(token, 0), Err(TokenError::Malformed), "{token}");
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug_output = format!("{:?}", keys());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("k3Y!9xQz"));
    }
}

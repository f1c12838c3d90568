//! Bearer token issuing and verification.
//!
//! Tokens are HS256 JWTs signed with `GALLERY_JWT_SECRET`. The payload
//! carries the user ID and role; a token without a role claim is a regular
//! user token. Verification is stateless: nothing is looked up per request.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gallery_core::{Role, UserId};

/// Errors from token verification or signing.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No `Authorization` header.
    #[error("no token, authorization denied")]
    Unauthenticated,

    /// Header present but carries no token.
    #[error("malformed authorization header")]
    Malformed,

    /// Bad signature, unexpected algorithm, garbage, or past `exp`.
    #[error("token is not valid")]
    InvalidOrExpired,

    /// Signing a new token failed.
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(default)]
    role: Role,
    #[serde(default)]
    iat: i64,
    exp: i64,
}

/// Signs and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenKeys {
    /// Build keys from the shared secret. Tokens live for `ttl_hours`.
    #[must_use]
    pub fn new(secret: &SecretString, ttl_hours: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issue a token for `user_id` acting as `role`.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Signing` if encoding fails.
    pub fn issue(&self, user_id: UserId, role: Role) -> Result<String, CredentialError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(CredentialError::Signing)
    }

    /// Resolve the raw `Authorization` header value to an identity.
    ///
    /// A leading `Bearer ` is stripped if present; a bare token is accepted
    /// too.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` if `header` is `None`
    /// - `Malformed` if no token remains after stripping
    /// - `InvalidOrExpired` if the token fails signature or expiry checks
    pub fn verify(&self, header: Option<&str>) -> Result<Identity, CredentialError> {
        let raw = header.ok_or(CredentialError::Unauthenticated)?;
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
        if token.is_empty() {
            return Err(CredentialError::Malformed);
        }

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                CredentialError::InvalidOrExpired
            })?;

        Ok(Identity {
            user_id: data.claims.user_id,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new(&SecretString::from("k8#Jd02!mZq7@Lp4$Xv9&Rt1^Wn6*Cb3"), 24)
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = keys();
        let token = keys.issue(UserId::new(7), Role::User).unwrap();
        let identity = keys.verify(Some(&format!("Bearer {token}"))).unwrap();
        assert_eq!(identity.user_id, UserId::new(7));
        assert!(!identity.is_admin());
    }

    #[test]
    fn test_bare_token_is_accepted() {
        let keys = keys();
        let token = keys.issue(UserId::new(7), Role::Admin).unwrap();
        let identity = keys.verify(Some(&token)).unwrap();
        assert!(identity.is_admin());
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            keys().verify(None),
            Err(CredentialError::Unauthenticated)
        ));
    }

    #[test]
    fn test_empty_bearer_is_malformed() {
        assert!(matches!(
            keys().verify(Some("Bearer    ")),
            Err(CredentialError::Malformed)
        ));
        assert!(matches!(
            keys().verify(Some("")),
            Err(CredentialError::Malformed)
        ));
    }

    #[test]
    fn test_legacy_admin_literal_is_rejected() {
        assert!(matches!(
            keys().verify(Some("Bearer admin-token")),
            Err(CredentialError::InvalidOrExpired)
        ));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = TokenKeys::new(&SecretString::from("Zq7@Lp4$Xv9&Rt1^Wn6*Cb3k8#Jd02!m"), 24);
        let token = other.issue(UserId::new(1), Role::Admin).unwrap();
        assert!(matches!(
            keys().verify(Some(&token)),
            Err(CredentialError::InvalidOrExpired)
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let keys = keys();
        let claims = Claims {
            user_id: UserId::new(1),
            role: Role::User,
            iat: Utc::now().timestamp() - 7200,
            exp: Utc::now().timestamp() - 3600,
        };
        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();
        assert!(matches!(
            keys.verify(Some(&token)),
            Err(CredentialError::InvalidOrExpired)
        ));
    }

    #[test]
    fn test_missing_role_claim_defaults_to_user() {
        #[derive(Serialize)]
        struct Bare {
            #[serde(rename = "userId")]
            user_id: i32,
            exp: i64,
        }
        let keys = keys();
        let bare = Bare {
            user_id: 3,
            exp: Utc::now().timestamp() + 60,
        };
        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &bare, &keys.encoding).unwrap();
        let identity = keys.verify(Some(&token)).unwrap();
        assert_eq!(identity.role, Role::User);
    }
}

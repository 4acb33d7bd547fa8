//! Bearer token management
//!
//! Issues and validates signed, stateless JWT credentials. The issuer is
//! constructed once from the configured secret and injected through
//! application state; there is no global signing key.
//!
//! Tokens are not revocable before expiry. Roles baked into a token stay
//! valid until `exp` even if revoked in the credential store afterwards,
//! which is why the default lifetime is kept short (see `AuthConfig`).

use crate::auth::RoleSet;
use crate::error::AppError;
use crate::users::User;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes a normal login token from one minted by impersonation
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Login,
    Impersonation,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Subject's username at issuance
    pub username: String,
    /// Subject's roles at issuance
    pub roles: RoleSet,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Login or impersonation token
    pub kind: TokenKind,
    /// For impersonation tokens: the acting admin's user ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub act: Option<Uuid>,
}

/// Signs and validates bearer tokens
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Issue a token for a freshly authenticated user
    pub fn issue_login(&self, user: &User) -> Result<String, AppError> {
        self.issue(user, TokenKind::Login, None)
    }

    /// Issue a token that authenticates as `target`, marked as minted by
    /// `actor_id`
    pub fn issue_impersonation(&self, actor_id: Uuid, target: &User) -> Result<String, AppError> {
        self.issue(target, TokenKind::Impersonation, Some(actor_id))
    }

    fn issue(&self, subject: &User, kind: TokenKind, act: Option<Uuid>) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.id,
            username: subject.username.clone(),
            roles: subject.roles.clone(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
            kind,
            act,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Decode and validate a bearer token
    ///
    /// A tampered or expired token is an `Unauthenticated` error; callers
    /// resolving identity treat that as "no identity", never as a
    /// fallback identity.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthenticated("Token expired".to_string())
                }
                _ => AppError::Unauthenticated("Invalid token".to_string()),
            })?;

        Ok(token_data.claims)
    }
}

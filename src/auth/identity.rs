//! Request identity resolution
//!
//! A request proves who it is with either a bearer token or a session
//! cookie. Resolution runs a fixed chain: the bearer resolver first (it
//! owns the decision whenever an `Authorization` header is present), the
//! session resolver second. The first resolver with an opinion wins, so
//! handlers never branch on transport.

use crate::auth::{RoleSet, TokenKind};
use crate::error::AppError;
use crate::state::AppState;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;
use uuid::Uuid;

/// Name of the HTTP-only session cookie
pub const SESSION_COOKIE: &str = "estateflow_session";

/// A resolved caller identity
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    /// Roles in effect for this request: current store roles for session
    /// auth, issuance-time roles for bearer auth
    pub roles: RoleSet,
    /// Set when the identity came from the session cookie
    pub session_id: Option<String>,
    /// Set when the identity came from an impersonation token
    pub impersonated_by: Option<Uuid>,
}

/// Resolve the caller's identity, or `None` for anonymous
///
/// The active flag is always re-checked against the credential store: a
/// deactivated user resolves to anonymous on both transports. Bearer
/// tokens keep their issuance-time roles until expiry (they are stateless
/// by design); session-based requests pick up role changes immediately.
pub async fn resolve_identity(
    state: &AppState,
    headers: &HeaderMap,
    jar: &CookieJar,
) -> Option<Identity> {
    if headers.contains_key(AUTHORIZATION) {
        // Header present: the bearer resolver owns the decision, the
        // cookie is not consulted
        return resolve_bearer(state, headers).await;
    }
    resolve_session(state, jar).await
}

/// Bearer resolver: a tampered or expired token is anonymous, never a
/// fallback identity
async fn resolve_bearer(state: &AppState, headers: &HeaderMap) -> Option<Identity> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))?;

    let claims = match state.tokens.decode(token) {
        Ok(claims) => claims,
        Err(_) => {
            debug!("Bearer token failed validation");
            return None;
        }
    };

    // Token signature vouches for the subject, but the account must
    // still exist and be active right now
    let user = state.users.find_by_id(claims.sub).await?;
    if !user.is_active {
        debug!(user_id = %user.id, "Bearer token for deactivated account");
        return None;
    }

    Some(Identity {
        user_id: claims.sub,
        username: claims.username,
        roles: claims.roles,
        session_id: None,
        impersonated_by: match claims.kind {
            TokenKind::Impersonation => claims.act,
            TokenKind::Login => None,
        },
    })
}

/// Session resolver: re-fetches the user so revoked roles and
/// deactivation take effect on the next request
async fn resolve_session(state: &AppState, jar: &CookieJar) -> Option<Identity> {
    let cookie = jar.get(SESSION_COOKIE)?;
    let session = state.sessions.get(cookie.value()).await?;

    let user = state.users.find_by_id(session.user_id).await?;
    if !user.is_active {
        state.sessions.destroy(&session.id).await;
        return None;
    }

    Some(Identity {
        user_id: user.id,
        username: user.username,
        roles: user.roles,
        session_id: Some(session.id),
        impersonated_by: None,
    })
}

/// Admit the caller iff they are authenticated and hold at least one of
/// the required roles
///
/// Anonymous and under-privileged are distinct outcomes (401 vs 403) and
/// are never collapsed.
pub fn require_any_role<'a>(
    identity: Option<&'a Identity>,
    required: &RoleSet,
) -> Result<&'a Identity, AppError> {
    let identity =
        identity.ok_or_else(|| AppError::Unauthenticated("Authentication required".to_string()))?;

    if !identity.roles.intersects(required) {
        return Err(AppError::Forbidden("Insufficient permissions".to_string()));
    }

    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn identity_with(roles: RoleSet) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            username: "someone".to_string(),
            roles,
            session_id: None,
            impersonated_by: None,
        }
    }

    #[test]
    fn test_anonymous_is_unauthenticated() {
        let result = require_any_role(None, &RoleSet::single(Role::Buyer));
        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn test_wrong_role_is_forbidden() {
        let identity = identity_with(RoleSet::single(Role::Buyer));
        let result = require_any_role(Some(&identity), &RoleSet::single(Role::WebsiteAdmin));
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_any_overlap_admits() {
        let identity = identity_with(RoleSet::new([Role::Seller, Role::Buyer]));
        let required = RoleSet::new([Role::Buyer, Role::WebsiteAdmin]);
        assert!(require_any_role(Some(&identity), &required).is_ok());
    }
}

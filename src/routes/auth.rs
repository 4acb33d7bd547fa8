//! Authentication route handlers
//!
//! Login, logout, identity lookup, impersonation, and the audit log view.

use crate::audit::AuditLogEntry;
use crate::auth::{
    self, require_any_role, resolve_identity, verify_password, Role, RoleSet, SESSION_COOKIE,
};
use crate::error::{validation_error, ApiResult, AppError};
use crate::state::SharedState;
use crate::users::UserResponse;
use axum::{extract::State, http::HeaderMap, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

// ============================================
// Request/Response Types
// ============================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username or email address
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Keep the session alive on the extended lifetime
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpersonateRequest {
    pub target_user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ImpersonateResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub success: bool,
    pub entries: Vec<AuditLogEntry>,
}

// ============================================
// Route Handlers
// ============================================

/// POST /api/auth/login
///
/// Authenticate with username (or email) and password. Produces both
/// transports at once: a server-side session bound to an HTTP-only
/// cookie, and a bearer token in the response body.
pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    // Locked identifiers fail fast, before the credential store is touched
    if state.attempts.is_locked(&req.username).await {
        warn!(identifier = %req.username, "Login rejected: identifier locked");
        return Err(AppError::AccountLocked(
            "Too many failed login attempts. Try again later.".to_string(),
        ));
    }

    let user = match state.users.find_by_identifier(&req.username).await {
        Some(user) => user,
        None => {
            // Count the failure even for unknown identifiers so behavior
            // does not reveal which accounts exist
            state.attempts.record_failure(&req.username).await;
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(&req.password, &user.password_hash)? {
        state.attempts.record_failure(&req.username).await;
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_active {
        return Err(AppError::AccountInactive(
            "This account has been deactivated".to_string(),
        ));
    }

    state.attempts.record_success(&req.username).await;
    state.users.touch_last_login(user.id).await?;

    let session = state.sessions.create(&user, req.remember_me).await;
    let token = state.tokens.issue_login(&user)?;

    info!(username = %user.username, "Login successful");

    let cookie = Cookie::build((SESSION_COOKIE, session.id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            token,
            user: UserResponse::from(&user),
        }),
    ))
}

/// POST /api/auth/logout
///
/// Destroy the cookie-named session, if any, and clear the cookie.
pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.destroy(cookie.value()).await;
        debug!("Session destroyed on logout");
    }

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());

    Ok((
        jar,
        Json(MessageResponse {
            success: true,
            message: "Logged out".to_string(),
        }),
    ))
}

/// GET /api/auth/me
///
/// Resolve the caller's identity: bearer token first, session cookie
/// second. Anonymous callers get a 401.
pub async fn me(
    State(state): State<SharedState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> ApiResult<Json<MeResponse>> {
    let identity = resolve_identity(&state, &headers, &jar)
        .await
        .ok_or_else(|| AppError::Unauthenticated("Not authenticated".to_string()))?;

    let user = state
        .users
        .find_by_id(identity.user_id)
        .await
        .ok_or_else(|| AppError::Unauthenticated("Not authenticated".to_string()))?;

    // Report the roles in effect for this request (bearer tokens keep
    // issuance-time roles), not whatever the store currently says
    let mut user = UserResponse::from(&user);
    user.roles = identity.roles;

    Ok(Json(MeResponse {
        success: true,
        user,
    }))
}

/// POST /api/auth/impersonate
///
/// Platform admins only: mint a bearer token scoped to another user.
/// The admin's own session is untouched, as are the target's.
pub async fn impersonate(
    State(state): State<SharedState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(req): Json<ImpersonateRequest>,
) -> ApiResult<Json<ImpersonateResponse>> {
    let identity = resolve_identity(&state, &headers, &jar).await;
    let actor = require_any_role(identity.as_ref(), &RoleSet::single(Role::WebsiteAdmin))?;

    let token = auth::impersonate(&state, actor, req.target_user_id).await?;

    Ok(Json(ImpersonateResponse {
        success: true,
        token,
    }))
}

/// GET /api/auth/audit
///
/// List audit entries for accountability review (platform admins only).
pub async fn audit_log(
    State(state): State<SharedState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> ApiResult<Json<AuditLogResponse>> {
    let identity = resolve_identity(&state, &headers, &jar).await;
    require_any_role(identity.as_ref(), &RoleSet::single(Role::WebsiteAdmin))?;

    Ok(Json(AuditLogResponse {
        success: true,
        entries: state.audit.entries().await,
    }))
}

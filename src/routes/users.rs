//! User administration route handlers
//!
//! Platform-admin endpoints for the out-of-scope provisioning flows this
//! core still has to support: listing users, changing role sets, and
//! soft-(de)activating accounts. Role and active-flag changes are
//! audited.

use crate::audit::{AuditAction, AuditLogEntry};
use crate::auth::{require_any_role, resolve_identity, Role, RoleSet};
use crate::error::ApiResult;
use crate::state::SharedState;
use crate::users::UserResponse;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct UsersListResponse {
    pub success: bool,
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    pub success: bool,
    pub user: UserResponse,
}

/// Role sets arrive through the normalizing `RoleSet` deserializer, so
/// legacy string-encoded payloads parse and unknown role names are
/// rejected at the boundary.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolesRequest {
    pub roles: RoleSet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub active: bool,
}

/// GET /api/users
///
/// List all users (platform admins only).
pub async fn list_users(
    State(state): State<SharedState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> ApiResult<Json<UsersListResponse>> {
    let identity = resolve_identity(&state, &headers, &jar).await;
    require_any_role(identity.as_ref(), &RoleSet::single(Role::WebsiteAdmin))?;

    Ok(Json(UsersListResponse {
        success: true,
        users: state.users.list().await,
    }))
}

/// PUT /api/users/{id}/roles
///
/// Replace a user's role set (platform admins only). Audited.
pub async fn update_roles(
    State(state): State<SharedState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateRolesRequest>,
) -> ApiResult<Json<UserDetailResponse>> {
    let identity = resolve_identity(&state, &headers, &jar).await;
    let actor = require_any_role(identity.as_ref(), &RoleSet::single(Role::WebsiteAdmin))?;

    let before = state.users.find_by_id(user_id).await.map(|u| u.roles);
    let updated = state.users.update_roles(user_id, req.roles).await?;

    state
        .audit
        .record(
            AuditLogEntry::new(actor.user_id, AuditAction::RolesChanged, updated.id)
                .with_metadata(json!({ "from": before, "to": updated.roles })),
        )
        .await?;

    info!(target = %updated.username, "User roles updated");

    Ok(Json(UserDetailResponse {
        success: true,
        user: UserResponse::from(&updated),
    }))
}

/// PUT /api/users/{id}/active
///
/// Activate or deactivate a user (platform admins only). Audited.
/// Deactivation is soft: the record stays, logins and token resolution
/// stop working.
pub async fn set_active(
    State(state): State<SharedState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(user_id): Path<Uuid>,
    Json(req): Json<SetActiveRequest>,
) -> ApiResult<Json<UserDetailResponse>> {
    let identity = resolve_identity(&state, &headers, &jar).await;
    let actor = require_any_role(identity.as_ref(), &RoleSet::single(Role::WebsiteAdmin))?;

    let updated = state.users.set_active(user_id, req.active).await?;

    state
        .audit
        .record(
            AuditLogEntry::new(actor.user_id, AuditAction::ActiveChanged, updated.id)
                .with_metadata(json!({ "active": req.active })),
        )
        .await?;

    info!(target = %updated.username, active = req.active, "User active flag updated");

    Ok(Json(UserDetailResponse {
        success: true,
        user: UserResponse::from(&updated),
    }))
}

//! Privileged impersonation
//!
//! Lets a platform admin obtain a bearer token that authenticates as
//! another user, for support work, without touching either party's
//! sessions. Every successful call writes exactly one audit entry, and
//! the token is only handed out after that entry landed; authorization
//! failures and missing targets write nothing.

use crate::audit::{AuditAction, AuditLogEntry};
use crate::auth::{Identity, Role};
use crate::error::AppError;
use crate::state::AppState;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

/// Mint an impersonation token for `target_user_id` on behalf of `actor`
pub async fn impersonate(
    state: &AppState,
    actor: &Identity,
    target_user_id: Uuid,
) -> Result<String, AppError> {
    if !actor.roles.contains(Role::WebsiteAdmin) {
        return Err(AppError::Forbidden(
            "Impersonation requires platform admin privileges".to_string(),
        ));
    }

    let target = state
        .users
        .find_by_id(target_user_id)
        .await
        .ok_or_else(|| AppError::NotFound("Target user not found".to_string()))?;

    if !target.is_active {
        return Err(AppError::AccountInactive(
            "Target account is deactivated".to_string(),
        ));
    }

    let token = state.tokens.issue_impersonation(actor.user_id, &target)?;

    // The token is not observable by the caller until this append
    // succeeds; an audit failure aborts the whole call
    state
        .audit
        .record(
            AuditLogEntry::new(actor.user_id, AuditAction::Impersonate, target.id)
                .with_metadata(json!({ "targetUsername": target.username })),
        )
        .await?;

    info!(
        actor = %actor.username,
        target = %target.username,
        "Impersonation token issued"
    );

    Ok(token)
}

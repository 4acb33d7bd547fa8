//! Application state management
//!
//! Contains shared state accessible across all handlers. Every stateful
//! auth component is constructed here and injected; nothing lives in
//! module-level statics.

use crate::audit::{AuditLog, AuditSink};
use crate::auth::{LoginAttemptTracker, TokenIssuer};
use crate::config::AuthConfig;
use crate::session::SessionStore;
use crate::users::UserStore;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
pub struct AppState {
    /// Credential store adapter
    pub users: UserStore,

    /// Cookie-keyed server-side sessions
    pub sessions: SessionStore,

    /// Failed-login counter with lockout
    pub attempts: LoginAttemptTracker,

    /// Append-only privileged-action log
    pub audit: Arc<dyn AuditSink>,

    /// Bearer token signing and validation
    pub tokens: TokenIssuer,
}

impl AppState {
    /// Create application state from the auth configuration
    pub fn new(auth: &AuthConfig) -> Self {
        Self::with_audit_sink(auth, Arc::new(AuditLog::new()))
    }

    /// Create application state with a caller-provided audit sink
    pub fn with_audit_sink(auth: &AuthConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            users: UserStore::new(),
            sessions: SessionStore::new(
                auth.session_idle_minutes,
                auth.session_absolute_minutes,
                auth.session_remember_minutes,
            ),
            attempts: LoginAttemptTracker::new(
                auth.lockout_threshold,
                Duration::from_secs(auth.lockout_window_secs),
                Duration::from_secs(auth.lockout_duration_secs),
            ),
            audit,
            tokens: TokenIssuer::new(&auth.jwt_secret, auth.token_ttl_minutes),
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;

//! Server-side session store
//!
//! Sessions are the cookie-backed authentication transport, held entirely
//! server-side and referenced by an unguessable random id. Independent of
//! bearer tokens: login produces both, impersonation touches neither.

use crate::auth::RoleSet;
use crate::users::User;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// An authenticated session bound to a cookie
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: Uuid,
    pub username: String,
    pub roles: RoleSet,
    /// "Remember me" sessions live on the extended lifetime
    pub remembered: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Thread-safe session store with idle and absolute expiry
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    idle_ttl: Duration,
    absolute_ttl: Duration,
    remember_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_minutes: i64, absolute_minutes: i64, remember_minutes: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl: Duration::minutes(idle_minutes),
            absolute_ttl: Duration::minutes(absolute_minutes),
            remember_ttl: Duration::minutes(remember_minutes),
        }
    }

    /// Create a session for a freshly authenticated user
    ///
    /// With `remember` set the session uses the extended lifetime instead
    /// of the idle/absolute pair.
    pub async fn create(&self, user: &User, remember: bool) -> Session {
        let now = Utc::now();
        let session = Session {
            id: generate_session_id(),
            user_id: user.id,
            username: user.username.clone(),
            roles: user.roles.clone(),
            remembered: remember,
            created_at: now,
            last_seen_at: now,
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());
        session
    }

    /// Resolve a session id, refreshing the idle window on a hit
    ///
    /// Expired sessions are removed on access and resolve to `None`.
    pub async fn get(&self, id: &str) -> Option<Session> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let expired = match sessions.get(id) {
            Some(s) => {
                let (idle_ttl, absolute_ttl) = if s.remembered {
                    (self.remember_ttl, self.remember_ttl)
                } else {
                    (self.idle_ttl, self.absolute_ttl)
                };
                now - s.created_at >= absolute_ttl || now - s.last_seen_at >= idle_ttl
            }
            None => return None,
        };

        if expired {
            sessions.remove(id);
            return None;
        }

        let session = sessions.get_mut(id)?;
        session.last_seen_at = now;
        Some(session.clone())
    }

    /// Destroy a session (logout)
    pub async fn destroy(&self, id: &str) {
        self.sessions.write().await.remove(id);
    }

    /// Number of live entries, including not-yet-purged expired ones
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// 256-bit random id, base64url-encoded
fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

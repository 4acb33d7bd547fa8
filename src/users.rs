//! User management module
//!
//! The credential-store adapter. Backed by an in-memory map here; a
//! database-backed implementation sits behind the same surface in
//! production deployments. This core only reads and updates user
//! records, it never deletes them (deactivation only).

use crate::auth::{Role, RoleSet};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: RoleSet,
    pub org_id: Option<Uuid>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Public projection of a user (never carries the password hash)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub display_name: String,
    pub roles: RoleSet,
    pub org_id: Option<Uuid>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            display_name: user.display_name(),
            roles: user.roles.clone(),
            org_id: user.org_id,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse::from(&user)
    }
}

/// Thread-safe user store with username and email indexes
pub struct UserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    username_index: Arc<RwLock<HashMap<String, Uuid>>>,
    email_index: Arc<RwLock<HashMap<String, Uuid>>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            username_index: Arc::new(RwLock::new(HashMap::new())),
            email_index: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a new user
    ///
    /// Usernames are case-sensitive unique; emails unique when present.
    /// An active user must carry at least one role.
    pub async fn create(&self, user: User) -> Result<User, AppError> {
        if user.is_active && user.roles.is_empty() {
            return Err(AppError::Validation(
                "An active user must have at least one role".to_string(),
            ));
        }

        let mut users = self.users.write().await;
        let mut username_index = self.username_index.write().await;
        let mut email_index = self.email_index.write().await;

        if username_index.contains_key(&user.username) {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        if let Some(email) = &user.email {
            if email_index.contains_key(email) {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
            email_index.insert(email.clone(), user.id);
        }

        username_index.insert(user.username.clone(), user.id);
        users.insert(user.id, user.clone());

        Ok(user)
    }

    /// Find user by exact username
    pub async fn find_by_username(&self, username: &str) -> Option<User> {
        // Release the index before touching the user map: `create` locks
        // users -> indexes, so holding both here in the other order would
        // deadlock against a concurrent create
        let id = {
            let username_index = self.username_index.read().await;
            username_index.get(username).copied()
        }?;
        let users = self.users.read().await;
        users.get(&id).cloned()
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        let id = {
            let email_index = self.email_index.read().await;
            email_index.get(email).copied()
        }?;
        let users = self.users.read().await;
        users.get(&id).cloned()
    }

    /// Find by login identifier: username first, then email
    pub async fn find_by_identifier(&self, identifier: &str) -> Option<User> {
        if let Some(user) = self.find_by_username(identifier).await {
            return Some(user);
        }
        self.find_by_email(identifier).await
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Option<User> {
        let users = self.users.read().await;
        users.get(&id).cloned()
    }

    /// List all users as public projections
    pub async fn list(&self) -> Vec<UserResponse> {
        let users = self.users.read().await;
        users.values().map(UserResponse::from).collect()
    }

    /// Replace a user's role set
    pub async fn update_roles(&self, id: Uuid, roles: RoleSet) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user.is_active && roles.is_empty() {
            return Err(AppError::Validation(
                "An active user must have at least one role".to_string(),
            ));
        }

        user.roles = roles;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    /// Activate or deactivate a user (soft-deactivation, never deletion)
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if active && user.roles.is_empty() {
            return Err(AppError::Validation(
                "Cannot activate a user with no roles".to_string(),
            ));
        }

        user.is_active = active;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    /// Stamp a successful login
    pub async fn touch_last_login(&self, id: Uuid) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        user.last_login_at = Some(Utc::now());
        user.updated_at = Utc::now();
        Ok(())
    }

    /// Initialize with a default platform admin for development
    pub async fn init_default_admin(&self) -> Result<(), AppError> {
        use crate::auth::hash_password;

        let now = Utc::now();
        let admin = User {
            id: Uuid::new_v4(),
            username: "admin".to_string(),
            email: Some("admin@estateflow.local".to_string()),
            password_hash: hash_password("admin123")?,
            first_name: "Platform".to_string(),
            last_name: "Admin".to_string(),
            roles: RoleSet::single(Role::WebsiteAdmin),
            org_id: None,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        // Ignore error if already exists
        let _ = self.create(admin).await;

        Ok(())
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use serde::Deserialize;
use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load environment variables: {0}")]
    EnvLoad(#[from] dotenvy::Error),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0), // Bind to 0.0.0.0 for containers
            port: 3000,
        }
    }
}

/// Authentication configuration
///
/// Covers token signing, session lifetimes, and the login lockout policy.
/// The signing secret has an insecure development default; `main` warns
/// loudly when it is in use.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for bearer token signing
    pub jwt_secret: String,
    /// Bearer token lifetime in minutes
    pub token_ttl_minutes: i64,
    /// Session idle timeout in minutes (sliding window)
    pub session_idle_minutes: i64,
    /// Session absolute lifetime in minutes
    pub session_absolute_minutes: i64,
    /// Session lifetime in minutes when "remember me" was requested
    pub session_remember_minutes: i64,
    /// Failed login attempts before lockout
    pub lockout_threshold: u32,
    /// Window in which failures are counted, in seconds
    pub lockout_window_secs: u64,
    /// How long a locked identifier stays locked, in seconds
    pub lockout_duration_secs: u64,
}

/// Development-only signing secret, used when JWT_SECRET is unset.
pub const DEV_JWT_SECRET: &str = "estateflow-dev-secret-change-in-production";

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_minutes: 60,
            session_idle_minutes: 30,
            session_absolute_minutes: 720,
            session_remember_minutes: 43_200, // 30 days
            lockout_threshold: 5,
            lockout_window_secs: 900,
            lockout_duration_secs: 900,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let server = ServerConfig {
            host: std::env::var("HOST")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().port),
        };

        let defaults = AuthConfig::default();
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| defaults.jwt_secret.clone());
        if jwt_secret.len() < 16 {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET must be at least 16 characters".to_string(),
            ));
        }

        let auth = AuthConfig {
            jwt_secret,
            token_ttl_minutes: env_parse("TOKEN_TTL_MINUTES", defaults.token_ttl_minutes),
            session_idle_minutes: env_parse("SESSION_IDLE_MINUTES", defaults.session_idle_minutes),
            session_absolute_minutes: env_parse(
                "SESSION_ABSOLUTE_MINUTES",
                defaults.session_absolute_minutes,
            ),
            session_remember_minutes: env_parse(
                "SESSION_REMEMBER_MINUTES",
                defaults.session_remember_minutes,
            ),
            lockout_threshold: env_parse("LOGIN_MAX_FAILURES", defaults.lockout_threshold),
            lockout_window_secs: env_parse("LOGIN_FAILURE_WINDOW_SECS", defaults.lockout_window_secs),
            lockout_duration_secs: env_parse("LOGIN_LOCKOUT_SECS", defaults.lockout_duration_secs),
        };

        if auth.lockout_threshold == 0 {
            return Err(ConfigError::InvalidValue(
                "LOGIN_MAX_FAILURES must be at least 1".to_string(),
            ));
        }

        let cors = CorsConfig {
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        Ok(Self { server, auth, cors })
    }

    /// True when the token signing secret is the development default.
    pub fn uses_dev_secret(&self) -> bool {
        self.auth.jwt_secret == DEV_JWT_SECRET
    }
}

/// Parse an environment variable, falling back to a default
fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_default_auth_config() {
        let config = AuthConfig::default();
        assert_eq!(config.lockout_threshold, 5);
        assert_eq!(config.lockout_window_secs, 900);
        assert_eq!(config.token_ttl_minutes, 60);
    }

    #[test]
    fn test_env_parse_fallback() {
        // Variable is unset, default wins
        assert_eq!(env_parse("ESTATEFLOW_NO_SUCH_VAR", 42u32), 42);
    }
}

//! Password hashing and verification
//!
//! Uses bcrypt, which salts the hash and compares in constant time.
//! Plaintext passwords never leave this module's call frames and are
//! never written to logs.

use crate::error::AppError;
use bcrypt::{hash, verify, DEFAULT_COST};

/// Hash a plaintext password for storage
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Check a plaintext password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))
}

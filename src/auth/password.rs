//! One-way credential hashing.
//!
//! Argon2id with the crate's default parameters; the salt is generated per
//! hash and embedded in the encoded string. `verify` never errors: a
//! malformed hash verifies as `false`, so callers can treat it exactly like
//! a wrong password.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::ApiError;

pub fn hash(plaintext: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}

pub fn verify(plaintext: &str, hash_string: &str) -> bool {
    let parsed = match PasswordHash::new(hash_string) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

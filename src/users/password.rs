//! bcrypt password hashing

use anyhow::{Context, Result};

/// Default bcrypt cost for new hashes
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a plaintext password.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).context("Failed to hash password")
}

/// Compare a plaintext password with a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

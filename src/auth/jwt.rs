//! Session tokens: HS256 JWTs naming an account by id.
//!
//! Issued on register and login and presented as
//! `Authorization: Bearer <token>` on protected routes.

use crate::users::User;
use crate::AuthConfig;
use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub email: String,
    pub name: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &User, expiry_secs: u64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            iat: now,
            exp: now.saturating_add(i64::try_from(expiry_secs).unwrap_or(i64::MAX)),
        }
    }

    /// The account the token was issued for. `None` if `sub` is not an id.
    pub fn user_id(&self) -> Option<Uuid> {
        self.sub.parse().ok()
    }
}

/// Sign arbitrary claims with the shared secret.
pub fn sign(claims: &Claims, secret: &str) -> Result<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT")
}

/// Token for `user`, valid for the configured lifetime.
pub fn issue_token(user: &User, config: &AuthConfig) -> Result<String> {
    sign(
        &Claims::for_user(user, config.jwt_expiry_secs),
        &config.jwt_secret,
    )
}

/// Check signature and expiry, returning the claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT")?;
    Ok(data.claims)
}

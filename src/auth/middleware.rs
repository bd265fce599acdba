//! Auth middleware for Axum routes.
//!
//! `require_auth` authenticates the bearer token and attaches an [`AuthUser`];
//! `authorize` then checks the user's role. Deny-by-default: if `auth_config`
//! is None, every protected request is rejected.

use crate::api::handlers::{ApiState, AppError};
use crate::auth::extractor::AuthUser;
use crate::auth::jwt::verify_token;
use crate::users::Role;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Roles allowed to create and update content
pub const EDITORS: &[Role] = &[Role::Admin, Role::Editor];

/// Roles allowed to delete content
pub const ADMINS: &[Role] = &[Role::Admin];

/// Middleware that requires a valid JWT Bearer token for an active user.
///
/// # Behavior
/// 1. If `auth_config` is `None` → 403 Forbidden (deny-by-default)
/// 2. Missing header or a scheme other than `Bearer ` → 401
/// 3. Invalid or expired token → 401
/// 4. Subject does not resolve to a user → 401
/// 5. Inactive user → 403
/// 6. Inject `AuthUser` into request extensions for downstream handlers
pub async fn require_auth(
    State(state): State<ApiState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_config = state.auth_config.as_ref().ok_or_else(|| {
        AppError::Forbidden("Authentication not configured, access denied".to_string())
    })?;

    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

    let invalid = || AppError::Unauthorized("Not authorized, invalid token".to_string());
    let claims = verify_token(token, &auth_config.jwt_secret).map_err(|e| {
        tracing::debug!("Rejected token: {:#}", e);
        invalid()
    })?;
    let user_id = claims.user_id().ok_or_else(invalid)?;

    let user = state
        .store
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if !user.is_active {
        return Err(AppError::Forbidden(
            "User account is deactivated".to_string(),
        ));
    }

    req.extensions_mut().insert(AuthUser::from(&user));

    Ok(next.run(req).await)
}

/// Role gate. Must run after [`require_auth`].
pub async fn authorize(
    allowed: &'static [Role],
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

    if !allowed.contains(&user.role) {
        return Err(AppError::Forbidden("Insufficient permissions".to_string()));
    }

    Ok(next.run(req).await)
}

// ============================================================================
// Tests
// ============================================================================

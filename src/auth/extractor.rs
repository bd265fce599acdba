//! AuthUser extractor for Axum handlers.
//!
//! Reads the identity that the `require_auth` middleware resolved from the
//! bearer token and stored in request extensions.

use crate::api::handlers::{ApiState, AppError};
use crate::users::{Role, User};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

/// Authenticated, active user attached to the request.
///
/// Use this as a handler parameter to require authentication
/// and access the user's identity:
///
/// ```rust,ignore
/// async fn my_handler(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl FromRequestParts<ApiState> for AuthUser {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &ApiState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async {
            parts
                .extensions
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
        }
    }
}
